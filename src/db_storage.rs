use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::filter::{Comparison, Condition, EnumMatch, LeadFilter, Predicate, TextMatch};
use crate::models::{Lead, LeadPatch, NewLead};
use crate::store::LeadStore;

const LEAD_COLUMNS: &str = "id, first_name, last_name, email, phone, company, city, state, \
     source, status, score, lead_value, last_activity_at, is_qualified, created_at, updated_at";

/// Row shape of the `leads` table. Enums are stored as text.
#[derive(Debug, FromRow)]
struct LeadRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    company: String,
    city: String,
    state: String,
    source: String,
    status: String,
    score: i32,
    lead_value: f64,
    last_activity_at: Option<DateTime<Utc>>,
    is_qualified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = AppError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        Ok(Lead {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            city: row.city,
            state: row.state,
            source: row.source.parse().map_err(AppError::InternalError)?,
            status: row.status.parse().map_err(AppError::InternalError)?,
            score: row.score,
            lead_value: row.lead_value,
            last_activity_at: row.last_activity_at,
            is_qualified: row.is_qualified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed lead store.
///
/// Filters are rendered with [`QueryBuilder`]; every operand is sent as a
/// bind parameter.
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends ` WHERE ...` for the filter (every predicate AND-ed).
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    qb.push(" WHERE TRUE");
    for predicate in filter.predicates() {
        qb.push(" AND ");
        push_predicate(qb, predicate);
    }
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    let column = predicate.field().column();
    match predicate.condition() {
        Condition::Text(TextMatch::Exact(value)) | Condition::Enum(EnumMatch::Exact(value)) => {
            qb.push(column).push(" = ").push_bind(value.clone());
        }
        Condition::Text(TextMatch::Wildcard(pattern)) => {
            qb.push(column)
                .push(" ILIKE ")
                .push_bind(pattern.to_like_pattern());
        }
        Condition::Enum(EnumMatch::AnyOf(options)) => {
            qb.push(column)
                .push(" = ANY(")
                .push_bind(options.clone())
                .push(")");
        }
        Condition::Number(comparison) => {
            // score is an INTEGER column; compare in double precision like lead_value.
            let expr = format!("CAST({} AS DOUBLE PRECISION)", column);
            push_comparison(qb, &expr, *comparison);
        }
        Condition::Date(comparison) => push_comparison(qb, column, *comparison),
        Condition::Bool(value) => {
            qb.push(column).push(" = ").push_bind(*value);
        }
    }
}

fn push_comparison<'args, T>(
    qb: &mut QueryBuilder<'args, Postgres>,
    expr: &str,
    comparison: Comparison<T>,
) where
    T: 'args + Send + sqlx::Encode<'args, Postgres> + sqlx::Type<Postgres>,
{
    match comparison {
        Comparison::Between(min, max) => {
            qb.push(expr)
                .push(" >= ")
                .push_bind(min)
                .push(" AND ")
                .push(expr)
                .push(" <= ")
                .push_bind(max);
        }
        Comparison::GreaterThan(bound) => {
            qb.push(expr).push(" > ").push_bind(bound);
        }
        Comparison::LessThan(bound) => {
            qb.push(expr).push(" < ").push_bind(bound);
        }
        Comparison::Equal(value) => {
            qb.push(expr).push(" = ").push_bind(value);
        }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert(&self, lead: NewLead) -> Result<Lead, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "INSERT INTO leads (id, first_name, last_name, email, phone, company, city, state, \
             source, status, score, lead_value, last_activity_at, is_qualified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) \
             RETURNING {}",
            LEAD_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.score)
        .bind(lead.lead_value)
        .bind(lead.last_activity_at)
        .bind(lead.is_qualified)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert lead")?;

        tracing::debug!("Inserted lead {}", row.id);
        row.try_into()
    }

    async fn find(
        &self,
        filter: &LeadFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Lead>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM leads", LEAD_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(skip).unwrap_or(i64::MAX));

        tracing::debug!("Lead query: {}", qb.sql());

        let rows = qb
            .build_query_as::<LeadRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list leads")?;

        rows.into_iter().map(Lead::try_from).collect()
    }

    async fn count(&self, filter: &LeadFilter) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_filter(&mut qb, filter);

        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count leads")?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {} FROM leads WHERE id = $1",
            LEAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load lead {}", id))?;

        row.map(Lead::try_from).transpose()
    }

    async fn update_by_id(&self, id: Uuid, patch: &LeadPatch) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "UPDATE leads SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                company = COALESCE($6, company), \
                city = COALESCE($7, city), \
                state = COALESCE($8, state), \
                source = COALESCE($9, source), \
                status = COALESCE($10, status), \
                score = COALESCE($11, score), \
                lead_value = COALESCE($12, lead_value), \
                last_activity_at = COALESCE($13, last_activity_at), \
                is_qualified = COALESCE($14, is_qualified), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            LEAD_COLUMNS
        ))
        .bind(id)
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.company.as_deref())
        .bind(patch.city.as_deref())
        .bind(patch.state.as_deref())
        .bind(patch.source.map(|s| s.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.score)
        .bind(patch.lead_value)
        .bind(patch.last_activity_at)
        .bind(patch.is_qualified)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to update lead {}", id))?;

        row.map(Lead::try_from).transpose()
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete lead {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM leads")
            .execute(&self.pool)
            .await
            .context("Failed to delete all leads")?;

        tracing::warn!("Deleted all {} leads", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::LeadFilter;

    fn render(params: &[(&str, &str)]) -> String {
        let filter = LeadFilter::from_params(params.iter().copied()).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_filter(&mut qb, &filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_filter_renders_tautology() {
        assert_eq!(render(&[]), "SELECT COUNT(*) FROM leads WHERE TRUE");
    }

    #[test]
    fn test_operands_are_bound_not_inlined() {
        let sql = render(&[
            ("email", "*@example.com"),
            ("status", "won,lost"),
            ("score", "50-80"),
            ("is_qualified", "true"),
        ]);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM leads WHERE TRUE \
             AND email ILIKE $1 \
             AND status = ANY($2) \
             AND CAST(score AS DOUBLE PRECISION) >= $3 AND CAST(score AS DOUBLE PRECISION) <= $4 \
             AND is_qualified = $5"
        );
        assert!(!sql.contains("example.com"));
    }

    #[test]
    fn test_date_comparators_render_on_raw_column() {
        let sql = render(&[("created_at", ">2024-01-01"), ("last_activity_at", "<2024-02-01")]);
        assert!(sql.contains("created_at > $1"));
        assert!(sql.contains("last_activity_at < $2"));
    }

    #[test]
    fn test_date_range_renders_inclusive_bounds() {
        let sql = render(&[("created_at", "2024-01-01,2024-01-31")]);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM leads WHERE TRUE AND created_at >= $1 AND created_at <= $2"
        );

        let sql = render(&[("created_at", "2024-01-15")]);
        assert!(sql.ends_with("AND created_at = $1"));
    }
}
