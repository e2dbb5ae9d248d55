mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::EntityTrait;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use db::models::question::{self, RegionCategory};
use db::models::{classroom, question_response};
use db::test_utils::{seed_exam, seed_professor, seed_student, setup_test_db};
use helpers::app::{
    MultipartBuilder, bearer_for, init_test_env, json_body, make_test_app, state_for,
    temp_storage,
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

fn get_request(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", auth)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, auth: &str, form: MultipartBuilder) -> Request<Body> {
    let (content_type, body) = form.build();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", auth)
        .header("Content-Type", content_type)
        .body(Body::from(body))
        .unwrap()
}

/// Test Case: creating an exam in an existing classroom, with and without
/// an explicit points total.
#[tokio::test]
#[serial]
async fn test_create_exam_in_classroom() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let room = classroom::Model::create(&db, "Thermodynamics II", None, professor.id)
        .await
        .unwrap();
    let app = make_test_app(state_for(db, &mock));
    let auth = bearer_for(&professor);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/exams",
            &auth,
            json!({
                "classroom_id": room.id,
                "title": "Final",
                "description": "Closed book",
                "points_possible": 80,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam created");
    assert_eq!(json["data"]["title"], "Final");
    assert_eq!(json["data"]["points_possible"], 80);
    assert_eq!(json["data"]["exam_stage"], 0);

    // points_possible defaults to 100 when omitted.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exams",
            &auth,
            json!({ "classroom_id": room.id, "title": "Supplementary" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["data"]["points_possible"], 100);
}

/// Test Case: an exam cannot be created in a classroom that does not exist.
#[tokio::test]
#[serial]
async fn test_create_exam_unknown_classroom_is_not_found() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let app = make_test_app(state_for(db, &mock));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exams",
            &bearer_for(&professor),
            json!({ "classroom_id": 999, "title": "Ghost exam" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Classroom not found");
}

/// Test Case: the workflow stage is stored verbatim and can move in both
/// directions; negative stages and unknown exams are rejected.
#[tokio::test]
#[serial]
async fn test_stage_roundtrip() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let app = make_test_app(state_for(db, &mock));
    let auth = bearer_for(&professor);
    let stage_uri = format!("/api/exams/{}/stage", exam.id);

    let response = app.clone().oneshot(get_request(&stage_uri, &auth)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam stage retrieved");
    assert_eq!(json["data"]["stage"], 0);

    let response = app
        .clone()
        .oneshot(json_request("POST", &stage_uri, &auth, json!({ "stage": 3 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam stage updated");
    assert_eq!(json["data"]["exam_id"], exam.id);
    assert_eq!(json["data"]["stage"], 3);

    let response = app.clone().oneshot(get_request(&stage_uri, &auth)).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["data"]["stage"], 3);

    // Backwards is allowed; negative is not.
    let response = app
        .clone()
        .oneshot(json_request("POST", &stage_uri, &auth, json!({ "stage": 1 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", &stage_uri, &auth, json!({ "stage": -1 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam stage must be a non-negative integer");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exams/999/stage",
            &auth,
            json!({ "stage": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam not found");
}

/// Test Case: question listing orders by number and decodes part labels.
#[tokio::test]
#[serial]
async fn test_get_questions_orders_and_decodes_labels() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let labels = vec!["2".to_string(), "2.1".to_string()];
    question::Model::create(&db, exam.id, 2, "Second", 5, Some(&labels))
        .await
        .unwrap();
    question::Model::create(&db, exam.id, 1, "First", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db, &mock));

    let response = app
        .oneshot(get_request(
            &format!("/api/exams/{}/questions", exam.id),
            &bearer_for(&professor),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "2 question(s)");
    let questions = json["data"].as_array().unwrap();
    assert_eq!(questions[0]["question_number"], 1);
    assert_eq!(questions[0]["part_labels"], json!([]));
    assert_eq!(questions[1]["question_number"], 2);
    assert_eq!(questions[1]["part_labels"], json!(["2", "2.1"]));
}

/// Test Case: editable question fields update in place; omitted fields
/// keep their values and ownership is checked against the exam.
#[tokio::test]
#[serial]
async fn test_update_question_fields() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let other = seed_exam(&db, professor.id, "Final").await;
    let labels = vec!["1".to_string(), "1.1".to_string()];
    let question = question::Model::create(&db, exam.id, 1, "Old text", 10, Some(&labels))
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));
    let auth = bearer_for(&professor);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/exams/{}/questions/{}", exam.id, question.id),
            &auth,
            json!({
                "text": "Define entropy.",
                "ideal_answer": "A measure of disorder.",
                "max_marks": 12,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Question updated");
    assert_eq!(json["data"]["text"], "Define entropy.");
    assert_eq!(json["data"]["ideal_answer"], "A measure of disorder.");
    assert_eq!(json["data"]["max_marks"], 12);
    assert_eq!(json["data"]["ideal_marking_scheme"], serde_json::Value::Null);
    assert_eq!(json["data"]["part_labels"], json!(["1", "1.1"]));

    // The same question under the wrong exam id is not found.
    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/exams/{}/questions/{}", other.id, question.id),
            &auth,
            json!({ "text": "Hijacked" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Question not found.");
}

/// Test Case: deleting an exam's questions reports the count and empties
/// the listing.
#[tokio::test]
#[serial]
async fn test_delete_questions_resets_exam() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    question::Model::create(&db, exam.id, 1, "First", 10, None).await.unwrap();
    question::Model::create(&db, exam.id, 2, "Second", 5, None).await.unwrap();
    let app = make_test_app(state_for(db, &mock));
    let auth = bearer_for(&professor);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/exams/{}/questions", exam.id))
                .header("Authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Questions deleted");
    assert_eq!(json["data"]["deleted"], 2);

    let response = app
        .oneshot(get_request(&format!("/api/exams/{}/questions", exam.id), &auth))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["message"], "0 question(s)");
    assert_eq!(json["data"], json!([]));
}

/// Test Case: answer-region crops are stored on disk with a running index
/// prefix and appended to the response's category column across uploads.
#[tokio::test]
#[serial]
async fn test_upload_answer_regions_stores_crops() {
    init_test_env();
    let _storage = temp_storage();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Sketch the cycle.", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));
    let auth = bearer_for(&professor);
    let uri = format!(
        "/api/exams/{}/student/{}/question/{}/regions",
        exam.id, student.id, question.id
    );

    let form = MultipartBuilder::new()
        .text("category", "diagram")
        .file("files", "cycle.png", "image/png", b"png-one")
        .file("files", "axes.png", "image/png", b"png-two");
    let response = app.clone().oneshot(multipart_request(&uri, &auth, form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Region images uploaded");
    assert_eq!(json["data"]["category"], "diagram");
    assert_eq!(json["data"]["added"], 2);
    assert_eq!(json["data"]["total"], 2);

    let dir = paths::answer_region_dir(exam.id, student.id, question.id);
    assert_eq!(std::fs::read(dir.join("0_cycle.png")).unwrap(), b"png-one");
    assert_eq!(std::fs::read(dir.join("1_axes.png")).unwrap(), b"png-two");

    // The response row did not exist before; the upload created it.
    let row = question_response::Model::find_by_question_and_student(&db, question.id, student.id)
        .await
        .unwrap()
        .unwrap();
    let images = row.answer_images(RegionCategory::Diagram);
    assert_eq!(images.len(), 2);
    assert!(images[0].ends_with("0_cycle.png"));

    // A second upload continues the index so filenames never collide.
    let form = MultipartBuilder::new()
        .text("category", "diagram")
        .file("files", "cycle.png", "image/png", b"png-three");
    let response = app.clone().oneshot(multipart_request(&uri, &auth, form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["added"], 1);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(std::fs::read(dir.join("2_cycle.png")).unwrap(), b"png-three");

    // Unknown category and empty uploads are rejected.
    let form = MultipartBuilder::new()
        .text("category", "sketch")
        .file("files", "cycle.png", "image/png", b"png");
    let response = app.clone().oneshot(multipart_request(&uri, &auth, form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["message"], "category must be one of text, table, diagram");

    let form = MultipartBuilder::new().text("category", "diagram");
    let response = app.clone().oneshot(multipart_request(&uri, &auth, form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["message"], "No files uploaded");

    // A question outside the exam is not found.
    let bad_uri = format!(
        "/api/exams/999/student/{}/question/{}/regions",
        student.id, question.id
    );
    let form = MultipartBuilder::new()
        .text("category", "diagram")
        .file("files", "cycle.png", "image/png", b"png");
    let response = app.oneshot(multipart_request(&bad_uri, &auth, form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Test Case: marking-scheme crops land on the question row.
#[tokio::test]
#[serial]
async fn test_upload_marking_regions_stores_crops() {
    init_test_env();
    let _storage = temp_storage();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Define entropy.", 10, None)
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    let form = MultipartBuilder::new()
        .text("category", "text")
        .file("files", "scheme.png", "image/png", b"scheme-png");
    let response = app
        .oneshot(multipart_request(
            &format!("/api/exams/{}/question/{}/ms-regions", exam.id, question.id),
            &bearer_for(&professor),
            form,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Marking-scheme images uploaded");
    assert_eq!(json["data"]["category"], "text");
    assert_eq!(json["data"]["total"], 1);

    let dir = paths::marking_region_dir(exam.id, question.id);
    assert_eq!(std::fs::read(dir.join("0_scheme.png")).unwrap(), b"scheme-png");

    let row = question::Entity::find_by_id(question.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.marking_images(RegionCategory::Text).len(), 1);
}

/// Test Case: label discovery rebuilds the question list. Part labels are
/// closed under ancestor prefixes, max marks come from the top-level
/// suffix, and labels with a non-numeric top level are dropped.
#[tokio::test]
#[serial]
async fn test_extract_question_labels_rebuilds_questions() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    // A stale question from a previous run; label discovery replaces it.
    question::Model::create(&db, exam.id, 9, "Stale", 3, None).await.unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    // "1.1.a" alone must pull "1.1" into existence; "A1" and "iv.2" are
    // not numeric top-levels and must not survive.
    mock.push_reply("1 - Max Marks - 10\n1.1.a\n2 - Max Marks - 5\n2.1\nA1\niv.2");
    let form = MultipartBuilder::new()
        .text("exam_id", &exam.id.to_string())
        .file("files", "page1.png", "image/png", b"page-png");
    let response = app
        .oneshot(multipart_request(
            "/api/extract-question-labels",
            &bearer_for(&professor),
            form,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Extracted 2 question(s)");
    let questions = json["data"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["question_number"], 1);
    assert_eq!(questions[0]["max_marks"], 10);
    assert_eq!(questions[0]["part_labels"], json!(["1", "1.1", "1.1.a"]));
    assert_eq!(questions[1]["question_number"], 2);
    assert_eq!(questions[1]["max_marks"], 5);
    assert_eq!(questions[1]["part_labels"], json!(["2", "2.1"]));

    let stored = question::Model::find_by_exam(&db, exam.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].question_number, 1);
    assert_eq!(stored[0].part_label_list(), vec!["1", "1.1", "1.1.a"]);
    assert!(stored.iter().all(|q| q.question_number != 9));
}

/// Test Case: when no label on any page survives parsing, the existing
/// questions are kept rather than wiped.
#[tokio::test]
#[serial]
async fn test_extract_question_labels_keeps_questions_when_none_found() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    question::Model::create(&db, exam.id, 1, "Keep me", 10, None).await.unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply("The page holds no question labels.");
    let form = MultipartBuilder::new()
        .text("exam_id", &exam.id.to_string())
        .file("files", "page1.png", "image/png", b"page-png");
    let response = app
        .oneshot(multipart_request(
            "/api/extract-question-labels",
            &bearer_for(&professor),
            form,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Extracted 0 question(s)");
    assert_eq!(json["data"]["questions"], json!([]));

    let stored = question::Model::find_by_exam(&db, exam.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "Keep me");
}

/// Test Case: the answer-region pipeline merges a batch reply back onto
/// the response, joining fragments in section order; an unreadable image
/// is dropped without failing the batch.
#[tokio::test]
#[serial]
async fn test_extract_answer_text_rebuilds_answers() {
    init_test_env();
    let _storage = temp_storage();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let student = seed_student(&db, "student@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 3, "Derive the relation.", 10, None)
        .await
        .unwrap();
    let response = question_response::Model::find_or_create(&db, question.id, student.id)
        .await
        .unwrap();

    let dir = paths::answer_region_dir(exam.id, student.id, question.id);
    std::fs::create_dir_all(&dir).unwrap();
    let mut crops = Vec::new();
    for name in ["0_part.png", "1_part.png"] {
        let path = dir.join(name);
        std::fs::write(&path, b"crop").unwrap();
        crops.push(path.to_string_lossy().into_owned());
    }
    // A recorded path with no file behind it; the pipeline skips it.
    crops.push(dir.join("2_missing.png").to_string_lossy().into_owned());
    question_response::Model::append_answer_images(
        &db,
        response.id,
        RegionCategory::Text,
        &crops,
    )
    .await
    .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply(
        "Question Number 3\nAnswer: First fragment.\n\nQuestion Number 3\nAnswer: Second fragment.",
    );
    let http_response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/exams/{}/student/{}/extract-answer-text", exam.id, student.id),
            &bearer_for(&professor),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(http_response.status(), StatusCode::OK);
    let json = json_body(http_response).await;
    assert_eq!(json["message"], "Updated 1 response(s)");
    assert_eq!(json["data"][0]["response_id"], response.id);
    assert_eq!(json["data"][0]["question_id"], question.id);
    assert_eq!(json["data"][0]["answer_text"], "First fragment.\nSecond fragment.");

    let updated = question_response::Model::find_by_question_and_student(&db, question.id, student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.answer_text.as_deref(), Some("First fragment.\nSecond fragment."));

    // Two readable crops uploaded, one composite call.
    assert_eq!(mock.upload_count(), 2);
    assert_eq!(mock.generate_count(), 1);
}

/// Test Case: the marking-region pipeline keys sections by
/// `question_id_index` and joins them in image order even when the reply
/// comes back reversed.
#[tokio::test]
#[serial]
async fn test_extract_marking_text_rebuilds_schemes() {
    init_test_env();
    let _storage = temp_storage();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let exam = seed_exam(&db, professor.id, "Midterm").await;
    let question = question::Model::create(&db, exam.id, 1, "Sketch the cycle.", 10, None)
        .await
        .unwrap();

    let dir = paths::marking_region_dir(exam.id, question.id);
    std::fs::create_dir_all(&dir).unwrap();
    let mut crops = Vec::new();
    for name in ["0_scheme.png", "1_scheme.png"] {
        let path = dir.join(name);
        std::fs::write(&path, b"crop").unwrap();
        crops.push(path.to_string_lossy().into_owned());
    }
    question::Model::append_marking_images(&db, question.id, RegionCategory::Text, &crops)
        .await
        .unwrap();
    let app = make_test_app(state_for(db.clone(), &mock));

    mock.push_reply(format!(
        "Key: {q}_1\nAward curve marks.\n\nKey: {q}_0\nAward axis marks.",
        q = question.id
    ));
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/exams/{}/extract-marking-text", exam.id),
            &bearer_for(&professor),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Updated 1 question(s)");
    assert_eq!(json["data"][0]["question_id"], question.id);
    assert_eq!(json["data"][0]["marking_scheme"], "Award axis marks.\nAward curve marks.");

    let updated = question::Entity::find_by_id(question.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        updated.ideal_marking_scheme.as_deref(),
        Some("Award axis marks.\nAward curve marks.")
    );
    assert_eq!(mock.generate_count(), 1);
}

/// Test Case: the extraction triggers 404 on a missing exam.
#[tokio::test]
#[serial]
async fn test_region_extraction_unknown_exam_is_not_found() {
    init_test_env();
    let mock = GeminiMock::spawn().await;
    let db = setup_test_db().await;
    let professor = seed_professor(&db, "prof@test.com").await;
    let app = make_test_app(state_for(db, &mock));
    let auth = bearer_for(&professor);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/exams/999/student/1/extract-answer-text",
            &auth,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/exams/999/extract-marking-text",
            &auth,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Exam not found");
}
