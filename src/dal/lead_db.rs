use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::lead::{Lead, LeadFilter, LeadStatus};

const LEAD_COLUMNS: &str = r#"
    id, company_name, category, address, phone_number, website_url,
    website_status, google_maps_url, status, scraped_at
"#;

pub async fn insert_leads(pool: &PgPool, leads: &[Lead]) -> Result<Vec<Lead>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(leads.len());

    for lead in leads {
        let row = sqlx::query_as::<_, Lead>(&format!(
            r#"
            insert into leads
                (id, company_name, category, address, phone_number, website_url,
                 website_status, google_maps_url, status, scraped_at)
            values
                ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            returning {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(lead.id)
        .bind(&lead.company_name)
        .bind(&lead.category)
        .bind(&lead.address)
        .bind(&lead.phone_number)
        .bind(&lead.website_url)
        .bind(lead.website_status)
        .bind(&lead.source_url)
        .bind(lead.status)
        .bind(lead.scraped_at)
        .fetch_one(&mut *tx)
        .await?;
        inserted.push(row);
    }

    tx.commit().await?;
    Ok(inserted)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    builder.push(" where true");

    if let Some(status) = filter.status {
        builder.push(" and status = ").push_bind(status);
    }
    if let Some(website_status) = filter.website_status {
        builder.push(" and website_status = ").push_bind(website_status);
    }
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        builder
            .push(" and category ilike ")
            .push_bind(format!("%{}%", category));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" and (company_name ilike ")
            .push_bind(pattern.clone())
            .push(" or address ilike ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn count_leads(pool: &PgPool, filter: &LeadFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("select count(*) from leads");
    push_filters(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn get_leads(
    pool: &PgPool,
    filter: &LeadFilter,
    paginate: bool,
) -> Result<Vec<Lead>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("select {} from leads", LEAD_COLUMNS));
    push_filters(&mut builder, filter);
    builder.push(" order by scraped_at desc");

    if paginate {
        builder
            .push(" limit ")
            .push_bind(filter.limit() as i64)
            .push(" offset ")
            .push_bind(filter.offset() as i64);
    }

    builder.build_query_as::<Lead>().fetch_all(pool).await
}

pub async fn get_lead(pool: &PgPool, id: Uuid) -> Result<Option<Lead>, sqlx::Error> {
    sqlx::query_as::<_, Lead>(&format!("select {} from leads where id = $1", LEAD_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_lead_status(
    pool: &PgPool,
    id: Uuid,
    status: LeadStatus,
) -> Result<Option<Lead>, sqlx::Error> {
    sqlx::query_as::<_, Lead>(&format!(
        r#"
        update leads set
            status = $1,
            updated_at = now()
        where
            id = $2
        returning {}
        "#,
        LEAD_COLUMNS
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_lead_log(pool: &PgPool, lead_id: Uuid, note: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        insert into lead_logs
            (lead_id, note)
        values
            ($1, $2)
        "#,
    )
    .bind(lead_id)
    .bind(note)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_lead(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("delete from leads where id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
