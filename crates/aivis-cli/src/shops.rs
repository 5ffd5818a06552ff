//! `aivis shops` — list registered shops.

use sqlx::PgPool;

pub(crate) async fn list(pool: &PgPool) -> anyhow::Result<()> {
    let shops = aivis_db::list_active_shops(pool).await?;

    if shops.is_empty() {
        println!("no active shops registered");
        return Ok(());
    }

    for shop in shops {
        println!(
            "{}\tplan={}\tbrand={}\tcompetitors={}",
            shop.slug,
            shop.plan_id,
            shop.brand_name,
            shop.competitors.len()
        );
    }
    Ok(())
}
