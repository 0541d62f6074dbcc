//! Example consumer: declares blog models on top of tiny-orm and runs CRUD against MySQL.
//!
//! Run from repo root: `cargo run -p blog-demo`
//! Needs `ORM_DB_USER`, `ORM_DB_PASSWORD` and `ORM_DB_NAME` (a `.env` file works).

use serde_json::json;
use tiny_orm::{
    close_pool, create_pool, next_id, register, unix_timestamp, Executor, Field, FindAll, Model, PoolConfig,
    Record,
};

struct User;

impl Model for User {
    const NAME: &'static str = "User";
    const TABLE: Option<&'static str> = Some("users");

    fn fields() -> Vec<(&'static str, Field)> {
        vec![
            ("id", Field::string().primary_key().default_with(next_id).ddl("varchar(50)")),
            ("email", Field::string().ddl("varchar(50)")),
            ("passwd", Field::string().ddl("varchar(50)")),
            ("admin", Field::boolean()),
            ("name", Field::string().ddl("varchar(50)")),
            ("image", Field::string().ddl("varchar(500)").default_value("about:blank")),
            ("created_at", Field::float().default_with(unix_timestamp)),
        ]
    }
}

struct Blog;

impl Model for Blog {
    const NAME: &'static str = "Blog";
    const TABLE: Option<&'static str> = Some("blogs");

    fn fields() -> Vec<(&'static str, Field)> {
        vec![
            ("id", Field::string().primary_key().default_with(next_id).ddl("varchar(50)")),
            ("user_id", Field::string().ddl("varchar(50)")),
            ("user_name", Field::string().ddl("varchar(50)")),
            ("user_image", Field::string().ddl("varchar(500)")),
            ("name", Field::string().ddl("varchar(50)")),
            ("summary", Field::string().ddl("varchar(200)")),
            ("content", Field::text()),
            ("created_at", Field::float().default_with(unix_timestamp)),
        ]
    }
}

struct Comment;

impl Model for Comment {
    const NAME: &'static str = "Comment";
    const TABLE: Option<&'static str> = Some("comments");

    fn fields() -> Vec<(&'static str, Field)> {
        vec![
            ("id", Field::string().primary_key().default_with(next_id).ddl("varchar(50)")),
            ("blog_id", Field::string().ddl("varchar(50)")),
            ("user_id", Field::string().ddl("varchar(50)")),
            ("user_name", Field::string().ddl("varchar(50)")),
            ("user_image", Field::string().ddl("varchar(500)")),
            ("content", Field::text()),
            ("created_at", Field::float().default_with(unix_timestamp)),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tiny_orm=info,blog_demo=info")),
        )
        .init();

    // schemas first: an invalid declaration stops the process before any connection opens
    let users = register::<User>()?;
    let blogs = register::<Blog>()?;
    let comments = register::<Comment>()?;

    let config = PoolConfig::from_env()?;
    let pool = create_pool(&config).await?;
    for schema in [&users, &blogs, &comments] {
        pool.execute(&schema.create_table_sql(), &[], true).await?;
    }

    let mut user = Record::of::<User>()?;
    user.set("email", "test@example.com")?;
    user.set("passwd", "1234567890")?;
    user.set("name", "Test")?;
    let saved = user.save(&pool).await?;
    if !saved.is_single_row() {
        tracing::warn!(affected = saved.affected, "user already exists");
    }
    let user_id = user.primary_key().cloned().unwrap_or_default();

    let mut blog = Record::of::<Blog>()?;
    blog.set("user_id", user_id.clone())?;
    blog.set("user_name", "Test")?;
    blog.set("user_image", user.get_or_default("image")?.unwrap_or_default())?;
    blog.set("name", "First post")?;
    blog.set("summary", "summary")?;
    blog.set("content", "hello from tiny-orm")?;
    let saved = blog.save(&pool).await?;
    if !saved.is_single_row() {
        tracing::warn!(affected = saved.affected, "blog not saved");
    }

    let mut comment = Record::of::<Comment>()?;
    comment.set("blog_id", blog.primary_key().cloned().unwrap_or_default())?;
    comment.set("user_id", user_id.clone())?;
    comment.set("user_name", "Test")?;
    comment.set("user_image", "about:blank")?;
    comment.set("content", "first!")?;
    let saved = comment.save(&pool).await?;
    if !saved.is_single_row() {
        tracing::warn!(affected = saved.affected, "comment not saved");
    }

    let found = Record::find(&pool, &users, user_id.clone()).await?;
    tracing::info!(found = found.is_some(), "find user by key");

    let recent = Record::find_all(
        &pool,
        &blogs,
        FindAll::new()
            .filter("`user_id` = ?", vec![user_id.clone()])
            .order_by("`created_at` desc")
            .limit((0, 10)),
    )
    .await?;
    tracing::info!(count = recent.len(), "blogs by user");

    let total = Record::find_number(&pool, &comments, "count(`id`)", Some("`user_id` = ?"), &[user_id]).await?;
    tracing::info!(total = %total.unwrap_or(json!(0)), "comments by user");

    for r in [&comment, &blog, &user] {
        let removed = r.remove(&pool).await?;
        if !removed.is_single_row() {
            tracing::warn!(affected = removed.affected, "nothing removed");
        }
    }

    close_pool().await?;
    Ok(())
}
