mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use db::models::question::{self, RegionCategory};
use db::models::{exam_result, question_response};
use db::test_utils::{seed_exam, seed_professor, seed_student, setup_test_db};
use helpers::app::{
    bearer_for, init_test_env, json_body, make_test_app, state_for, temp_storage,
};
use helpers::gemini_mock::GeminiMock;
use util::paths;

fn json_request(method: &str, uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test Case: grading one response persists the grade and recomputes the
/// student's exam total.
#[tokio::test]
#[serial]
async fn test_grade_question_persists_accepted_grade() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let response = question_response::Model::find_or_create(&db, question.id, student.id)
        .await
        .unwrap();
    question_response::Model::set_answer_text(&db, response.id, "Entropy measures disorder.")
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply("Grade: 7\nReason: Covers the definition but not the second law.");
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
                "ideal_answer": "Entropy is a measure of disorder; it never decreases.",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Question graded");
    assert_eq!(json["data"]["grade"], 7.0);
    assert_eq!(
        json["data"]["reasoning"],
        "Covers the definition but not the second law."
    );
    assert!(json["data"]["raw_response"].as_str().unwrap().contains("Grade: 7"));

    let graded =
        question_response::Model::find_by_question_and_student(&db, question.id, student.id)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(graded.marks_obtained, Some(7.0));
    assert_eq!(
        graded.reasoning.as_deref(),
        Some("Covers the definition but not the second law.")
    );

    let total = exam_result::Model::find_by_exam_and_student(&db, exam.id, student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(total.marks_obtained, 7.0);
    assert_eq!(total.graded_by, Some(professor.id));
}

/// Test Case: a fractional `X/Y` grade is read as its numerator.
#[tokio::test]
#[serial]
async fn test_grade_question_reads_fraction_grades() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db, &mock));

    mock.push_reply("Grade: 8/10\nReason: Nearly complete.");
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
                "student_answer": "Entropy is disorder and it never decreases.",
                "ideal_answer": "Entropy is a measure of disorder.",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["grade"], 8.0);
}

/// Test Case: a grade above max_marks is rejected, not clamped, and
/// nothing is persisted.
#[tokio::test]
#[serial]
async fn test_out_of_range_grade_is_rejected_not_clamped() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let response = question_response::Model::find_or_create(&db, question.id, student.id)
        .await
        .unwrap();
    question_response::Model::set_answer_text(&db, response.id, "Entropy measures disorder.")
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply("Grade: 12\nReason: Exceptional answer.");
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
                "ideal_answer": "Entropy is a measure of disorder.",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["grade"], serde_json::Value::Null);
    assert_eq!(json["data"]["reasoning"], "Exceptional answer.");

    let untouched =
        question_response::Model::find_by_question_and_student(&db, question.id, student.id)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(untouched.marks_obtained, None);
    assert!(
        exam_result::Model::find_by_exam_and_student(&db, exam.id, student.id)
            .await
            .unwrap()
            .is_none()
    );
}

/// Test Case: no stored answer and none in the body is a 400 before the
/// model is called.
#[tokio::test]
#[serial]
async fn test_grade_question_without_material_is_bad_request() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db, &mock));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["message"],
        "Missing required parameters. Provide a student answer and at least one of ideal answer \
         or marking scheme."
    );
    assert_eq!(mock.generate_count(), 0);
}

/// Test Case: a question under a different exam is a 404.
#[tokio::test]
#[serial]
async fn test_grade_question_checks_exam_ownership() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let other = seed_exam(&db, professor.id, "Final").await;
    let question = question::Model::create(&db, other.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db, &mock));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
                "student_answer": "Disorder.",
                "ideal_answer": "Entropy is a measure of disorder.",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Question not found.");
}

/// Test Case: the diagram variant attaches the stored answer crops to the
/// grading call.
#[tokio::test]
#[serial]
async fn test_grade_question_with_diagram_uploads_stored_crops() {
    init_test_env();
    let _storage = temp_storage();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 2, "Sketch the cycle.", 10, None)
        .await
        .unwrap();
    question::Model::set_marking_scheme(&db, question.id, "Award 5 per labelled axis.")
        .await
        .unwrap();
    let response = question_response::Model::find_or_create(&db, question.id, student.id)
        .await
        .unwrap();

    // Two diagram crops on disk, recorded on the response.
    let dir = paths::answer_region_dir(exam.id, student.id, question.id);
    std::fs::create_dir_all(&dir).unwrap();
    let mut crops = Vec::new();
    for name in ["0_cycle.png", "1_axes.png"] {
        let path = dir.join(name);
        std::fs::write(&path, b"fake png bytes").unwrap();
        crops.push(path.to_string_lossy().into_owned());
    }
    question_response::Model::append_answer_images(
        &db,
        response.id,
        RegionCategory::Diagram,
        &crops,
    )
    .await
    .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply("Grade: 5\nReason: One axis is unlabelled.");
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/grade-question-with-diagram",
            &bearer_for(&professor),
            json!({
                "exam_id": exam.id,
                "student_id": student.id,
                "question_id": question.id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["grade"], 5.0);

    let names = mock.uploaded_names();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"0_cycle.png".to_string()));
    assert!(names.contains(&"1_axes.png".to_string()));
    assert_eq!(mock.generate_count(), 1);

    let graded =
        question_response::Model::find_by_question_and_student(&db, question.id, student.id)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(graded.marks_obtained, Some(5.0));
}

/// Test Case: grading a whole exam reports per-question outcomes; a
/// question with no response fails in place without stopping its siblings.
#[tokio::test]
#[serial]
async fn test_grade_exam_reports_each_question() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let answered = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    question::Model::set_marking_scheme(&db, answered.id, "6 marks for the second law.")
        .await
        .unwrap();
    let unanswered = question::Model::create(&db, exam.id, 2, "State the third law.", 5, None)
        .await
        .unwrap();
    let response = question_response::Model::find_or_create(&db, answered.id, student.id)
        .await
        .unwrap();
    question_response::Model::set_answer_text(&db, response.id, "It never decreases.")
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply("Grade: 6\nReason: Second law stated correctly.");
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/{}/grade-exam", exam.id),
            &bearer_for(&student),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Graded 2 question(s)");
    let results = json["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0]["question_id"], answered.id);
    assert_eq!(results[0]["question_number"], 1);
    assert_eq!(results[0]["grade"], 6.0);
    assert!(results[0].get("error").is_none());

    assert_eq!(results[1]["question_id"], unanswered.id);
    assert_eq!(results[1]["grade"], serde_json::Value::Null);
    assert_eq!(results[1]["error"], "No response recorded for this question");

    let total = exam_result::Model::find_by_exam_and_student(&db, exam.id, student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(total.marks_obtained, 6.0);
    assert_eq!(total.graded_by, Some(student.id));
}

/// Test Case: grading an unknown exam is a 404.
#[tokio::test]
#[serial]
async fn test_grade_exam_unknown_exam_is_not_found() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let student = seed_student(&db, "student@test.com").await;
    let app = make_test_app(state_for(db, &mock));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/999/grade-exam",
            &bearer_for(&student),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam not found");
}
