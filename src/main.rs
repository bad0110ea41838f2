use clap::Parser;
use hortencia::application::bookings::BookingService;
use hortencia::application::payments::PaymentService;
use hortencia::application::rooms::RoomService;
use hortencia::config::AppConfig;
use hortencia::domain::ports::{
    BookingStoreRef, PaymentGatewayRef, PaymentStoreRef, RoomStoreRef,
};
use hortencia::infrastructure::in_memory::{
    InMemoryBookingStore, InMemoryPaymentStore, InMemoryRoomStore,
};
#[cfg(feature = "storage-rocksdb")]
use hortencia::infrastructure::rocksdb::RocksDBStore;
use hortencia::infrastructure::paystack::PaystackClient;
use hortencia::interfaces::http::{self, AppState};
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,
}

fn in_memory_stores() -> (PaymentStoreRef, BookingStoreRef, RoomStoreRef) {
    (
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(InMemoryRoomStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    #[cfg(feature = "storage-rocksdb")]
    let (payment_store, booking_store, room_store): (
        PaymentStoreRef,
        BookingStoreRef,
        RoomStoreRef,
    ) = if let Some(db_path) = cli.db_path.clone() {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        (
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    } else {
        in_memory_stores()
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let (payment_store, booking_store, room_store) = in_memory_stores();

    let gateway: PaymentGatewayRef =
        Arc::new(PaystackClient::new(&config.paystack).into_diagnostic()?);

    let state = AppState {
        payments: Arc::new(PaymentService::new(
            payment_store,
            booking_store.clone(),
            gateway,
            &config,
        )),
        bookings: Arc::new(BookingService::new(booking_store.clone())),
        rooms: Arc::new(RoomService::new(room_store, booking_store)),
    };

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %cli.bind, "listening");
    axum::serve(listener, http::router(state))
        .await
        .into_diagnostic()?;

    Ok(())
}
