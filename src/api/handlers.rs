//! One handler per endpoint
//!
//! Id routes validate the id list before the query string, matching the
//! order errors are reported in.

use super::error::ApiError;
use super::params::{check_site, parse_filter, parse_ids, parse_query, Scope};
use super::AppState;
use crate::model::{Answer, Collective, Question};
use crate::output::{write_dump, ApiResponse, Endpoint};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Serialize;
use std::collections::HashMap;

type Args = Query<HashMap<String, String>>;
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// `GET /questions`
pub async fn questions(State(state): State<AppState>, Query(args): Args) -> ApiResult<Question> {
    let params = parse_query(&args, Scope::Listing)?;
    tracing::debug!("GET /questions {:?}", params);

    let response = state.coordinator.questions(&params).await?;
    Ok(respond(&state, Endpoint::Questions, response).await)
}

/// `GET /questions/{ids}`
pub async fn questions_by_ids(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(args): Args,
) -> ApiResult<Question> {
    let ids = parse_ids(&ids)?;
    let params = parse_query(&args, Scope::Ids)?;
    tracing::debug!("GET /questions/{:?} {:?}", ids, params);

    let response = state.coordinator.questions_by_ids(&ids, &params).await?;
    Ok(respond(&state, Endpoint::QuestionsByIds, response).await)
}

/// `GET /questions/{ids}/answers`
pub async fn answers_of_questions(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(args): Args,
) -> ApiResult<Answer> {
    let ids = parse_ids(&ids)?;
    let params = parse_query(&args, Scope::Ids)?;
    tracing::debug!("GET /questions/{:?}/answers {:?}", ids, params);

    let response = state
        .coordinator
        .answers_by_question_ids(&ids, &params)
        .await?;
    Ok(respond(&state, Endpoint::AnswersOfQuestions, response).await)
}

/// `GET /answers/{ids}`
pub async fn answers_by_ids(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(args): Args,
) -> ApiResult<Answer> {
    let ids = parse_ids(&ids)?;
    let params = parse_query(&args, Scope::Ids)?;
    tracing::debug!("GET /answers/{:?} {:?}", ids, params);

    let response = state.coordinator.answers_by_ids(&ids, &params).await?;
    Ok(respond(&state, Endpoint::AnswersByIds, response).await)
}

/// `GET /collectives`; only `site` and `filter` are read
pub async fn collectives(
    State(state): State<AppState>,
    Query(args): Args,
) -> ApiResult<Collective> {
    check_site(&args)?;
    let filter = parse_filter(&args)?;

    let response = state.coordinator.collectives(filter).await?;
    Ok(respond(&state, Endpoint::Collectives, response).await)
}

/// Any other path
pub async fn no_method() -> ApiError {
    ApiError::no_method()
}

/// Writes the dump when configured and wraps the body
async fn respond<T: Serialize>(
    state: &AppState,
    endpoint: Endpoint,
    response: ApiResponse<T>,
) -> Json<ApiResponse<T>> {
    if let Some(dir) = &state.dump_dir {
        if let Err(e) = write_dump(dir, endpoint, &response).await {
            tracing::warn!("Could not write {}: {}", endpoint.file_name(), e);
        }
    }
    Json(response)
}
