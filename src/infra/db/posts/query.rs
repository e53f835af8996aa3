//! SQL assembly for filtered, paginated post listings.
//!
//! A [`PostQueryFilter`] compiles into [`FilterClause`]s made of static SQL
//! fragments and bound values. User-supplied text only ever reaches Postgres
//! as a bind parameter. The page query and the count query are built from the
//! same clauses so the total always describes the listed rows.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::application::pagination::PageParams;
use crate::application::repos::{PostOrdering, PostQueryFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BindValue {
    Text(String),
    Bool(bool),
    Uuid(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Sql(&'static str),
    Bind(BindValue),
}

/// One predicate of the WHERE clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterClause {
    segments: Vec<Segment>,
}

impl FilterClause {
    fn sql(mut self, fragment: &'static str) -> Self {
        self.segments.push(Segment::Sql(fragment));
        self
    }

    fn bind(mut self, value: BindValue) -> Self {
        self.segments.push(Segment::Bind(value));
        self
    }

    fn push_to(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for segment in &self.segments {
            match segment {
                Segment::Sql(fragment) => {
                    qb.push(*fragment);
                }
                Segment::Bind(BindValue::Text(value)) => {
                    qb.push_bind(value.clone());
                }
                Segment::Bind(BindValue::Bool(value)) => {
                    qb.push_bind(*value);
                }
                Segment::Bind(BindValue::Uuid(value)) => {
                    qb.push_bind(*value);
                }
            }
        }
    }

    #[cfg(test)]
    fn bind_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Bind(_)))
            .count()
    }
}

/// The AND-joined predicates for one listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PostFilterClauses {
    clauses: Vec<FilterClause>,
}

impl PostFilterClauses {
    pub(crate) fn from_filter(filter: &PostQueryFilter) -> Self {
        let mut clauses = Vec::new();

        if let Some(category) = filter.category.as_ref() {
            clauses.push(
                FilterClause::default()
                    .sql("p.category = ")
                    .bind(BindValue::Text(category.clone())),
            );
        }

        if let Some(published) = filter.published.as_bool() {
            clauses.push(
                FilterClause::default()
                    .sql("p.published = ")
                    .bind(BindValue::Bool(published)),
            );
        }

        if let Some(search) = filter.search.as_ref() {
            let pattern = format!("%{}%", escape_like(search));
            clauses.push(
                FilterClause::default()
                    .sql("(p.title ILIKE ")
                    .bind(BindValue::Text(pattern.clone()))
                    .sql(" OR p.excerpt ILIKE ")
                    .bind(BindValue::Text(pattern.clone()))
                    .sql(" OR p.content ILIKE ")
                    .bind(BindValue::Text(pattern))
                    .sql(")"),
            );
        }

        if let Some(id) = filter.id {
            clauses.push(
                FilterClause::default()
                    .sql("p.id = ")
                    .bind(BindValue::Uuid(id)),
            );
        }

        Self { clauses }
    }

    pub(crate) fn len(&self) -> usize {
        self.clauses.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub(crate) fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (index, clause) in self.clauses.iter().enumerate() {
            qb.push(if index == 0 { " WHERE " } else { " AND " });
            clause.push_to(qb);
        }
    }
}

/// Escape LIKE metacharacters so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(crate) fn build_page_query(
    clauses: &PostFilterClauses,
    ordering: PostOrdering,
    page: PageParams,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(super::SELECT_POSTS);
    clauses.push_where(&mut qb);

    qb.push(match ordering {
        PostOrdering::Recent => " ORDER BY p.created_at DESC, p.id DESC",
        PostOrdering::Popular => " ORDER BY p.view_count DESC, p.created_at DESC, p.id DESC",
    });

    qb.push(" LIMIT ");
    qb.push_bind(i64::from(page.page_size));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    qb
}

pub(crate) fn build_count_query(clauses: &PostFilterClauses) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
    clauses.push_where(&mut qb);
    qb
}
