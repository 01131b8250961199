#[tokio::main]
async fn main() {
    partstore::start_server().await;
}
