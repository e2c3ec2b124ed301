#[tokio::main]
async fn main() -> anyhow::Result<()> {
    postura_lib::run().await
}
