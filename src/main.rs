mod poolstore;

use tokio::runtime::Builder;
use tracing::{info_span, Level};
use tracing_subscriber::FmtSubscriber;

use crate::poolstore::config::load_config;
use crate::poolstore::server::StoreServer;

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let _span = info_span!("startup").entered();

    let conf = load_config("poolstore.yaml").expect("could not load config");

    let tokio = Builder::new_multi_thread()
        .worker_threads(conf.num_workers as usize)
        .enable_all()
        .build()
        .expect("could not create tokio runtime");

    let server = StoreServer::new(&conf).expect("could not start server");
    tokio.block_on(server.run());
}
