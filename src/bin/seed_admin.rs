use std::env;

use anyhow::{Context, Result};

use onboard_backend::auth::seed_admin_user;
use onboard_backend::db;

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let username = env::var("ADMIN_USERNAME").context("ADMIN_USERNAME must be set")?;
    let password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;

    let pool = db::init_pool(&database_url)?;
    let mut conn = pool.get()?;

    if seed_admin_user(&mut conn, &username, &password)? {
        println!("created admin login {username}");
    } else {
        println!("login {username} already exists, nothing to do");
    }

    Ok(())
}
