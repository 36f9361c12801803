use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tokio::sync::RwLock;

use crate::models::{GoalRecord, MealLogRecord};

/// Half-open UTC interval covering one or more local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    pub fn for_date(tz: Tz, date: NaiveDate) -> Self {
        Self::between(tz, date, date)
    }

    /// Inclusive on both dates.
    pub fn between(tz: Tz, from: NaiveDate, to: NaiveDate) -> Self {
        let end_date = to.succ_opt().unwrap_or(to);
        Self {
            start: local_midnight(tz, from),
            end: local_midnight(tz, end_date),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .with_timezone(&Utc)
}

/// Append/query store for goals and meal logs, keyed by user.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn insert_goal(&self, goal: &GoalRecord) -> Result<i64>;
    async fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool>;
    /// Latest first.
    async fn list_goals(&self, user_id: &str) -> Result<Vec<GoalRecord>>;
    async fn insert_meal_log(&self, entry: &MealLogRecord) -> Result<i64>;
    /// Chronological (insertion) order.
    async fn list_meal_logs(&self, user_id: &str, range: DayRange) -> Result<Vec<MealLogRecord>>;
    async fn clear_meal_logs(&self, user_id: &str, range: DayRange) -> Result<u64>;
}

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let db = Database { pool };
        db.init_tables().await?;
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS goals (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                goal TEXT NOT NULL,
                current_weight DOUBLE PRECISION NOT NULL,
                target_weight DOUBLE PRECISION NOT NULL,
                daily_calorie_target BIGINT NOT NULL,
                burn_suggestion TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meal_logs (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                description TEXT NOT NULL,
                food_item TEXT NOT NULL,
                calories BIGINT NOT NULL,
                suggestion TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS meal_logs_user_created ON meal_logs (user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn calories_from_db(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

#[async_trait::async_trait]
impl Store for Database {
    async fn insert_goal(&self, goal: &GoalRecord) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO goals (user_id, goal, current_weight, target_weight,
                               daily_calorie_target, burn_suggestion, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&goal.user_id)
        .bind(&goal.goal)
        .bind(goal.current_weight)
        .bind(goal.target_weight)
        .bind(goal.daily_calorie_target as i64)
        .bind(&goal.burn_suggestion)
        .bind(goal.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get(0))
    }

    async fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<GoalRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, goal, current_weight, target_weight,
                   daily_calorie_target, burn_suggestion, created_at
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let goals = rows
            .into_iter()
            .map(|row| GoalRecord {
                id: Some(row.get(0)),
                user_id: row.get(1),
                goal: row.get(2),
                current_weight: row.get(3),
                target_weight: row.get(4),
                daily_calorie_target: calories_from_db(row.get(5)),
                burn_suggestion: row.get(6),
                created_at: row.get(7),
            })
            .collect();

        Ok(goals)
    }

    async fn insert_meal_log(&self, entry: &MealLogRecord) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO meal_logs (user_id, description, food_item, calories, suggestion, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.description)
        .bind(&entry.food_item)
        .bind(entry.calories as i64)
        .bind(&entry.suggestion)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get(0))
    }

    async fn list_meal_logs(&self, user_id: &str, range: DayRange) -> Result<Vec<MealLogRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, description, food_item, calories, suggestion, created_at
            FROM meal_logs
            WHERE user_id = $1
                AND created_at >= $2
                AND created_at < $3
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let logs = rows
            .into_iter()
            .map(|row| MealLogRecord {
                id: Some(row.get(0)),
                user_id: row.get(1),
                description: row.get(2),
                food_item: row.get(3),
                calories: calories_from_db(row.get(4)),
                suggestion: row.get(5),
                created_at: row.get(6),
            })
            .collect();

        Ok(logs)
    }

    async fn clear_meal_logs(&self, user_id: &str, range: DayRange) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM meal_logs WHERE user_id = $1 AND created_at >= $2 AND created_at < $3",
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Default)]
struct MemoryTables {
    goals: Vec<GoalRecord>,
    meal_logs: Vec<MealLogRecord>,
    next_id: i64,
}

impl MemoryTables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store for running without Postgres and for tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_goal(&self, goal: &GoalRecord) -> Result<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut goal = goal.clone();
        goal.id = Some(id);
        tables.goals.push(goal);
        Ok(id)
    }

    async fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.goals.len();
        tables
            .goals
            .retain(|g| !(g.id == Some(id) && g.user_id == user_id));
        Ok(tables.goals.len() < before)
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<GoalRecord>> {
        let tables = self.tables.read().await;
        // Insertion order is chronological, so reversing gives latest first.
        Ok(tables
            .goals
            .iter()
            .rev()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_meal_log(&self, entry: &MealLogRecord) -> Result<i64> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let mut entry = entry.clone();
        entry.id = Some(id);
        tables.meal_logs.push(entry);
        Ok(id)
    }

    async fn list_meal_logs(&self, user_id: &str, range: DayRange) -> Result<Vec<MealLogRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .meal_logs
            .iter()
            .filter(|m| m.user_id == user_id && range.contains(m.created_at))
            .cloned()
            .collect())
    }

    async fn clear_meal_logs(&self, user_id: &str, range: DayRange) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.meal_logs.len();
        tables
            .meal_logs
            .retain(|m| !(m.user_id == user_id && range.contains(m.created_at)));
        Ok((before - tables.meal_logs.len()) as u64)
    }
}
