//! Runs against a real MySQL server when `ORM_DB_USER`, `ORM_DB_PASSWORD` and
//! `ORM_DB_NAME` are set; each test returns early otherwise.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tiny_orm::{
    create_pool, pool, register, Executor, Field, FindAll, Model, OrmError, Pool, PoolConfig, Record, Schema,
};

struct LiveUser;

impl Model for LiveUser {
    const NAME: &'static str = "LiveUser";
    const TABLE: Option<&'static str> = Some("tiny_orm_live_users");

    fn fields() -> Vec<(&'static str, Field)> {
        vec![
            ("id", Field::string().primary_key().ddl("varchar(50)")),
            ("name", Field::string()),
            ("email", Field::string()),
            ("admin", Field::boolean()),
            ("score", Field::float()),
            ("image", Field::string().default_value("about:blank")),
        ]
    }
}

fn live_config() -> Option<PoolConfig> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut config = PoolConfig::from_env().ok()?;
    config.max_size = 4;
    config.min_size = config.min_size.min(4);
    Some(config)
}

async fn prepared(config: &PoolConfig) -> (Pool, Arc<Schema>) {
    let pool = Pool::connect(config).await.unwrap();
    let schema = register::<LiveUser>().unwrap();
    pool.execute(&schema.create_table_sql(), &[], true).await.unwrap();
    (pool, schema)
}

#[tokio::test]
async fn save_then_find_round_trips() {
    let Some(config) = live_config() else { return };
    let (pool, schema) = prepared(&config).await;

    let id = tiny_orm::next_id();
    let mut user = Record::with_values(
        schema.clone(),
        [
            ("id", id.clone()),
            ("name", json!("a")),
            ("email", json!("a@x")),
            ("admin", json!(true)),
            ("score", json!(1.5)),
        ],
    )
    .unwrap();
    assert!(user.save(&pool).await.unwrap().is_single_row());

    let found = Record::find(&pool, &schema, id.clone()).await.unwrap().unwrap();
    assert_eq!(found, user);

    let again = user.save(&pool).await;
    assert!(matches!(again, Err(OrmError::Db(_))));

    user.set("name", "b").unwrap();
    assert!(user.update(&pool).await.unwrap().is_single_row());
    let rows = Record::find_all(
        &pool,
        &schema,
        FindAll::new().filter("`id` = ?", vec![id.clone()]).order_by("`name`"),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").unwrap(), Some(&json!("b")));

    let n = Record::find_number(&pool, &schema, "count(`id`)", Some("`id` = ?"), &[id])
        .await
        .unwrap();
    assert_eq!(n, Some(json!(1)));

    assert!(user.remove(&pool).await.unwrap().is_single_row());
    assert_eq!(user.remove(&pool).await.unwrap().affected, 0);
    pool.close().await;
}

#[tokio::test]
async fn concurrent_callers_see_only_their_own_results() {
    let Some(config) = live_config() else { return };
    let (pool, schema) = prepared(&config).await;
    let callers = config.max_size as usize * 2;

    let mut handles = Vec::with_capacity(callers);
    for i in 0..callers {
        let pool = pool.clone();
        let schema = schema.clone();
        handles.push(tokio::spawn(async move {
            let rows = pool.select("select ? as `v`", &[json!(i)], None).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["v"], json!(i));

            let mut user = Record::new(schema);
            user.set("id", tiny_orm::next_id()).unwrap();
            user.set("name", format!("caller-{}", i)).unwrap();
            let saved = user.save(&pool).await.unwrap();
            assert_eq!(saved.affected, 1);
            assert_eq!(user.remove(&pool).await.unwrap().affected, 1);
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert!(pool.size() <= config.max_size);
    pool.close().await;
}

#[tokio::test]
async fn select_honors_row_limit() {
    let Some(config) = live_config() else { return };
    let pool = Pool::connect(&config).await.unwrap();
    let rows = pool
        .select("select 1 as `n` union all select 2 union all select 3", &[], Some(2))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    let err = pool.select("select ? as `n`", &[], None).await.unwrap_err();
    assert!(matches!(err, OrmError::InvalidArgument(_)));
    pool.close().await;
}

#[tokio::test]
async fn global_pool_initializes_once() {
    let Some(config) = live_config() else { return };
    create_pool(&config).await.unwrap();
    assert!(matches!(create_pool(&config).await, Err(OrmError::PoolAlreadyInitialized)));
    let shared = pool().unwrap();
    let rows = shared.select("select 1 as `one`", &[], None).await.unwrap();
    assert_eq!(rows[0]["one"], json!(1));
    tiny_orm::close_pool().await.unwrap();
    assert!(shared.is_closed());
}

async fn wait_for_idle(pool: &Pool, n: usize) {
    let settled = tokio::time::timeout(Duration::from_secs(10), async {
        while pool.num_idle() != n {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(settled.is_ok(), "pool never got back to {} idle connections", n);
}

#[tokio::test]
async fn lease_returns_on_error_and_cancellation() {
    let Some(mut config) = live_config() else { return };
    config.max_size = 1;
    config.min_size = config.min_size.min(1);
    let pool = Pool::connect(&config).await.unwrap();
    let within = |secs| Duration::from_secs(secs);

    let err = tokio::time::timeout(within(10), pool.select("select * from `tiny_orm_no_such_table`", &[], None))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, OrmError::Db(_)));
    let rows = tokio::time::timeout(within(10), pool.select("select 1 as `one`", &[], None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rows[0]["one"], json!(1));
    wait_for_idle(&pool, 1).await;

    let err = tokio::time::timeout(
        within(10),
        pool.execute("insert into `tiny_orm_no_such_table` values (?)", &[json!(1)], false),
    )
    .await
    .unwrap()
    .unwrap_err();
    assert!(matches!(err, OrmError::Db(_)));
    wait_for_idle(&pool, 1).await;

    let cancelled = tokio::time::timeout(Duration::from_millis(200), pool.select("select sleep(2)", &[], None)).await;
    assert!(cancelled.is_err());
    let rows = tokio::time::timeout(within(10), pool.select("select 2 as `two`", &[], None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rows[0]["two"], json!(2));
    wait_for_idle(&pool, 1).await;
    assert_eq!(pool.size(), 1);
    pool.close().await;
}

#[tokio::test]
async fn decimal_aggregates_are_numbers() {
    let Some(config) = live_config() else { return };
    let pool = Pool::connect(&config).await.unwrap();
    let rows = pool
        .select(
            "select sum(`v`) as `total`, avg(`v`) as `mean` from (select 1 as `v` union all select 2) as `t`",
            &[],
            None,
        )
        .await
        .unwrap();
    assert_eq!(rows[0]["total"], json!(3));
    assert_eq!(rows[0]["mean"], json!(1.5));
    pool.close().await;
}
