use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskRequest, UpdateTaskRequest},
    store::TaskStore,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use log::info;

/// Parses the `{id}` path segment. A numeric id too large for a task id cannot match any
/// task and is reported as not found.
fn task_id(raw: &str) -> Result<i32, AppError> {
    if let Ok(id) = raw.parse::<i32>() {
        return Ok(id);
    }
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Err(not_found())
    } else {
        Err(AppError::BadRequest("Invalid task id".into()))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the tasks of the authenticated user.
///
/// ## Responses:
/// - `200 OK`: JSON array of the caller's tasks, ordered by id. Empty if there are none.
/// - `401 Unauthorized`: If the request lacks a valid access token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let list = tasks.list(user.0).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// Creates a new task for the authenticated user.
///
/// The owner is always the caller; any owner information in the body is ignored.
///
/// ## Request Body:
/// - `title`: required, non-empty.
/// - `completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: The new task.
/// - `400 Bad Request`: Missing title or malformed body.
/// - `401 Unauthorized`: If the request lacks a valid access token.
#[post("")]
pub async fn create_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let new_task = task_data.into_inner().into_new_task(user.0)?;
    let task = tasks.create(new_task).await?;
    info!("User {} created task {}", user.0, task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its id.
///
/// ## Responses:
/// - `200 OK`: The task, if it exists and belongs to the caller.
/// - `400 Bad Request`: Non-numeric id.
/// - `404 Not Found`: Missing, or owned by another user.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = task_id(&path)?;
    let task = tasks.find(user.0, id).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates the title and/or completion flag of a task the caller owns.
///
/// Absent fields, and an empty title, keep their stored values.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    path: web::Path<String>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let id = task_id(&path)?;
    let changes = task_data.into_inner().into_changes();
    let task = tasks
        .update(user.0, id, changes)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task the caller owns.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: Missing, or owned by another user.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskStore>,
    user: AuthenticatedUserId,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = task_id(&path)?;
    if !tasks.delete(user.0, id).await? {
        return Err(not_found());
    }
    info!("User {} deleted task {}", user.0, id);
    Ok(HttpResponse::NoContent().finish())
}
