use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::Serialize;

use crate::{
    Course, EngineError, ExportFormat, MoneyCents, ResultEngine, courses, sales,
    tabular::courses_to_bytes,
};

use super::{Engine, map_unique, matches_any, normalize_required_text, search_needle, with_tx};

/// Page size used by exports, which serialize a single large page.
pub const EXPORT_PAGE_SIZE: u64 = 1000;

/// Fields of a course as typed by the user.
#[derive(Clone, Debug)]
pub struct CourseInput {
    pub name: String,
    pub description: String,
    pub price: MoneyCents,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Search and pagination for [`Engine::list_courses`].
///
/// `page` is 1-based.
#[derive(Clone, Debug)]
pub struct CourseQuery {
    pub search: Option<String>,
    pub order: SortOrder,
    pub page: u64,
    pub page_size: u64,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            search: None,
            order: SortOrder::Asc,
            page: 1,
            page_size: 10,
        }
    }
}

/// One page of courses plus the number of matches before pagination.
#[derive(Clone, Debug, Serialize)]
pub struct CoursePage {
    pub total: u64,
    pub courses: Vec<Course>,
}

fn validate_input(input: &CourseInput) -> ResultEngine<String> {
    if input.price.is_negative() {
        return Err(EngineError::Validation("price must be >= 0".to_string()));
    }
    normalize_required_text(&input.name, "course name")
}

impl Engine {
    /// Creates a course. The name must not be used by any other course.
    ///
    /// `created_at` defaults to now.
    pub async fn create_course(
        &self,
        input: CourseInput,
        created_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<Course> {
        let name = validate_input(&input)?;
        with_tx!(self, |db_tx| {
            let exists = courses::Entity::find()
                .filter(courses::Column::Name.eq(name.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let model = courses::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name.clone()),
                description: ActiveValue::Set(input.description),
                price_minor: ActiveValue::Set(input.price.cents()),
                created_at: ActiveValue::Set(created_at.unwrap_or_else(Utc::now)),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| map_unique(err, &name))?;

            tracing::info!("created course {} ({})", model.id, model.name);
            Ok(Course::from(model))
        })
    }

    /// Overwrites name, description and price of an existing course.
    ///
    /// Renaming to a name held by a *different* course fails with
    /// [`EngineError::ExistingKey`]; keeping the current name is fine.
    pub async fn update_course(&self, course_id: i32, input: CourseInput) -> ResultEngine<Course> {
        let name = validate_input(&input)?;
        with_tx!(self, |db_tx| {
            let current = courses::Entity::find_by_id(course_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("course {course_id}")))?;

            if current.name != name {
                let taken = courses::Entity::find()
                    .filter(courses::Column::Name.eq(name.as_str()))
                    .filter(courses::Column::Id.ne(course_id))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(name));
                }
            }

            let mut active: courses::ActiveModel = current.into();
            active.name = ActiveValue::Set(name.clone());
            active.description = ActiveValue::Set(input.description);
            active.price_minor = ActiveValue::Set(input.price.cents());
            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| map_unique(err, &name))?;

            tracing::info!("updated course {}", model.id);
            Ok(Course::from(model))
        })
    }

    /// Deletes a course.
    ///
    /// Courses referenced by sales are kept: deletion fails with
    /// [`EngineError::Validation`] instead of orphaning or cascading.
    pub async fn delete_course(&self, course_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            courses::Entity::find_by_id(course_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("course {course_id}")))?;

            let referencing = sales::Entity::find()
                .filter(sales::Column::CourseId.eq(course_id))
                .count(&db_tx)
                .await?;
            if referencing > 0 {
                return Err(EngineError::Validation(format!(
                    "course {course_id} is referenced by {referencing} sale(s)"
                )));
            }

            courses::Entity::delete_by_id(course_id)
                .exec(&db_tx)
                .await?;

            tracing::info!("deleted course {course_id}");
            Ok(())
        })
    }

    /// Lists courses ordered by creation time.
    ///
    /// `search` matches name or description, case-insensitively. `total` is
    /// the number of matches before pagination.
    pub async fn list_courses(&self, query: &CourseQuery) -> ResultEngine<CoursePage> {
        if query.page == 0 || query.page_size == 0 {
            return Err(EngineError::Validation(
                "page and page_size must be >= 1".to_string(),
            ));
        }
        let offset = (query.page - 1).saturating_mul(query.page_size);
        with_tx!(self, |db_tx| {
            let select = match query.order {
                SortOrder::Asc => courses::Entity::find()
                    .order_by_asc(courses::Column::CreatedAt)
                    .order_by_asc(courses::Column::Id),
                SortOrder::Desc => courses::Entity::find()
                    .order_by_desc(courses::Column::CreatedAt)
                    .order_by_desc(courses::Column::Id),
            };

            let (total, models) = match search_needle(query.search.as_deref()) {
                None => {
                    let total = select.clone().count(&db_tx).await?;
                    let models = select
                        .offset(offset)
                        .limit(query.page_size)
                        .all(&db_tx)
                        .await?;
                    (total, models)
                }
                Some(needle) => {
                    let matching: Vec<_> = select
                        .all(&db_tx)
                        .await?
                        .into_iter()
                        .filter(|m| {
                            matches_any(&needle, &[m.name.as_str(), m.description.as_str()])
                        })
                        .collect();
                    let total = matching.len() as u64;
                    let models = matching
                        .into_iter()
                        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                        .take(usize::try_from(query.page_size).unwrap_or(usize::MAX))
                        .collect();
                    (total, models)
                }
            };

            tracing::debug!("listed {} of {total} courses", models.len());
            Ok(CoursePage {
                total,
                courses: models.into_iter().map(Course::from).collect(),
            })
        })
    }

    /// Serializes every course matching `search` (up to
    /// [`EXPORT_PAGE_SIZE`]) in the requested format.
    pub async fn export_courses(
        &self,
        format: ExportFormat,
        search: Option<&str>,
    ) -> ResultEngine<Vec<u8>> {
        let page = self
            .list_courses(&CourseQuery {
                search: search.map(ToString::to_string),
                page_size: EXPORT_PAGE_SIZE,
                ..CourseQuery::default()
            })
            .await?;
        tracing::debug!("exporting {} courses as {format}", page.courses.len());
        courses_to_bytes(&page.courses, format)
    }
}
