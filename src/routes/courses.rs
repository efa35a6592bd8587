use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::InteractionInput;
use crate::models::course::{Assignment, Course};
use crate::models::user::{AssignmentProgress, Role, User};
use crate::response::{json_error, SuccessResponse};
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCourseRequest {
    title: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddStudentRequest {
    student_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddAssignmentRequest {
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    points: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitAssignmentRequest {
    score: Option<f64>,
    difficulty: Option<String>,
    time_spent: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionData {
    message: &'static str,
    assignment: Assignment,
}

pub async fn list(State(state): State<AppState>, Extension(user): Extension<User>) -> Response {
    let courses = match user.role {
        Role::Teacher => state.courses().filter(|course| course.teacher_id == user.id),
        Role::Student => state.courses().filter(|course| course.has_student(&user.id)),
        Role::Parent => Vec::new(),
    };

    SuccessResponse::of(courses).into_response()
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateCourseRequest>,
) -> Response {
    if user.role != Role::Teacher {
        return json_error(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Only teachers can create courses",
        )
        .into_response();
    }

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Title is required")
            .into_response();
    }

    let course = Course::new(title, payload.description, user.id.clone());

    if let Err(err) = state.courses().insert(course.clone()).await {
        return store_failure(err, "course create failed");
    }

    // The teacher's own course list mirrors the collection.
    let linked = state
        .users()
        .update(
            |candidate| candidate.id == user.id,
            |record| record.courses.push(course.id.clone()),
        )
        .await;
    if let Err(err) = linked {
        return store_failure(err, "course link failed");
    }

    (StatusCode::CREATED, SuccessResponse::of(course)).into_response()
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(course_id): Path<String>,
) -> Response {
    let Some(course) = state.courses().find(|course| course.id == course_id) else {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
            .into_response();
    };

    let has_access = (user.role == Role::Teacher && course.teacher_id == user.id)
        || (user.role == Role::Student && course.has_student(&user.id));
    if !has_access {
        return json_error(StatusCode::FORBIDDEN, "FORBIDDEN", "Access denied").into_response();
    }

    SuccessResponse::of(course).into_response()
}

pub async fn submit_assignment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((course_id, assignment_id)): Path<(String, String)>,
    payload: Option<Json<SubmitAssignmentRequest>>,
) -> Response {
    let Some(course) = state.courses().find(|course| course.id == course_id) else {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
            .into_response();
    };

    if user.role != Role::Student || !course.has_student(&user.id) {
        return json_error(StatusCode::FORBIDDEN, "FORBIDDEN", "Access denied").into_response();
    }

    if course.assignment(&assignment_id).is_none() {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Assignment not found")
            .into_response();
    }

    let updated = state
        .courses()
        .update(
            |candidate| candidate.id == course_id,
            |record| {
                if let Some(assignment) = record
                    .assignments
                    .iter_mut()
                    .find(|assignment| assignment.id == assignment_id)
                {
                    assignment.status = "submitted".to_string();
                    assignment.submitted_date = Some(Utc::now());
                    assignment.attempts += 1;
                }
                record.updated_at = Utc::now();
            },
        )
        .await;

    let course = match updated {
        Ok(Some(course)) => course,
        Ok(None) => {
            return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
                .into_response();
        }
        Err(err) => return store_failure(err, "assignment submit failed"),
    };

    // A graded submission also moves the student's mastery rate.
    let submission = payload.map(|Json(body)| body).unwrap_or_default();
    let interaction = InteractionInput {
        kind: "assignment".to_string(),
        subject: Some(course.title.clone()),
        score: submission.score,
        difficulty: submission.difficulty,
        time_spent: submission.time_spent,
    };
    if let Err(err) = state.mastery().record_interaction(&user.id, interaction).await {
        return store_failure(err, "assignment interaction failed");
    }

    let Some(assignment) = course.assignment(&assignment_id).cloned() else {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Assignment not found")
            .into_response();
    };

    SuccessResponse::of(SubmissionData {
        message: "Assignment submitted successfully",
        assignment,
    })
    .into_response()
}

pub async fn add_student(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(course_id): Path<String>,
    Json(payload): Json<AddStudentRequest>,
) -> Response {
    let Some(course) = state.courses().find(|course| course.id == course_id) else {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
            .into_response();
    };

    if course.teacher_id != user.id {
        return json_error(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Only the course teacher can add students",
        )
        .into_response();
    }

    let student_id = payload.student_id;
    let is_student = state
        .users()
        .contains(|candidate| candidate.id == student_id && candidate.role == Role::Student);
    if !is_student {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Student not found")
            .into_response();
    }

    if course.has_student(&student_id) {
        return SuccessResponse::of(course).into_response();
    }

    let updated = state
        .courses()
        .update(
            |candidate| candidate.id == course_id,
            |record| {
                record.students.push(student_id.clone());
                record.updated_at = Utc::now();
            },
        )
        .await;
    let course = match updated {
        Ok(Some(course)) => course,
        Ok(None) => {
            return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
                .into_response();
        }
        Err(err) => return store_failure(err, "enrollment failed"),
    };

    let enrolled = state
        .users()
        .update(
            |candidate| candidate.id == student_id,
            |record| record.enrolled_courses.push(course_id.clone()),
        )
        .await;
    if let Err(err) = enrolled {
        return store_failure(err, "student enrollment link failed");
    }

    let roster = state
        .users()
        .update(
            |candidate| candidate.id == course.teacher_id,
            |record| record.students.push(student_id.clone()),
        )
        .await;
    if let Err(err) = roster {
        return store_failure(err, "teacher roster update failed");
    }

    SuccessResponse::of(course).into_response()
}

pub async fn add_assignment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(course_id): Path<String>,
    Json(payload): Json<AddAssignmentRequest>,
) -> Response {
    let Some(course) = state.courses().find(|course| course.id == course_id) else {
        return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
            .into_response();
    };

    if course.teacher_id != user.id {
        return json_error(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Only the course teacher can add assignments",
        )
        .into_response();
    }

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Title is required")
            .into_response();
    }

    let assignment = Assignment::new(title, payload.description, payload.due_date, payload.points);
    let assignment_id = assignment.id.clone();

    let updated = state
        .courses()
        .update(
            |candidate| candidate.id == course_id,
            |record| {
                record.assignments.push(assignment.clone());
                record.updated_at = Utc::now();
            },
        )
        .await;
    let course = match updated {
        Ok(Some(course)) => course,
        Ok(None) => {
            return json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Course not found")
                .into_response();
        }
        Err(err) => return store_failure(err, "assignment create failed"),
    };

    // Every enrolled student starts with a pending entry for the new work.
    for student_id in &course.students {
        let stamped = state
            .users()
            .update(
                |candidate| candidate.id == *student_id,
                |record| {
                    record.achievements.push(AssignmentProgress {
                        course_id: course_id.clone(),
                        assignment_id: assignment_id.clone(),
                        status: "pending".to_string(),
                        attempts: 0,
                    });
                },
            )
            .await;
        if let Err(err) = stamped {
            return store_failure(err, "assignment progress stamp failed");
        }
    }

    SuccessResponse::of(course).into_response()
}

fn store_failure(err: StoreError, context: &'static str) -> Response {
    tracing::error!(error = %err, "{context}");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Something went wrong",
    )
    .into_response()
}
