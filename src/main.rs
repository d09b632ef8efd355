#[tokio::main]
async fn main() -> anyhow::Result<()> {
    workload_gateway_lib::run().await
}
