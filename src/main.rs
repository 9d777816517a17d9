#[tokio::main]
async fn main() -> anyhow::Result<()> {
    proctor_fusion::run().await
}
