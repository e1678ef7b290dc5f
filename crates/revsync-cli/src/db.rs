use revsync_core::AppConfig;

pub(crate) async fn ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = revsync_db::connect_pool_from_config(config).await?;
    let result = revsync_db::ping(&pool).await;
    pool.close().await;
    result?;
    println!("database reachable");
    Ok(())
}
