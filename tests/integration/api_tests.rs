use super::helpers::*;
use super::test_server::{test_config, TestServer};
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::{Body, Method, Request, StatusCode};
use resource_hub::application::{CreateResourceRequest, FileDescriptor};
use resource_hub::config::{Config, StorageBackend};
use resource_hub::domain::ResourceCategory;
use serde_json::json;

#[tokio::test]
async fn test_ping() {
    let server = TestServer::start().await;

    let response = get(&server.url("/ping")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "pong");
}

#[cfg(test)]
mod list_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_returns_seeded_catalog_in_order() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers[CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );

        let list = response.json();
        assert_eq!(list["totalCount"], 6);
        assert_eq!(ids(&list), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(list["resources"][0]["downloadCount"], 145);
        assert_eq!(list["resources"][0]["category"], "lecture_notes");
    }

    #[tokio::test]
    async fn test_list_with_and_without_api_prefix() {
        let server = TestServer::start().await;

        let plain = get(&server.url("/resources?category=past_questions")).await;
        let prefixed = get(&server.url("/api/resources?category=past_questions")).await;

        assert_eq!(ids(&plain.json()), vec!["2", "5"]);
        assert_eq!(plain.json(), prefixed.json());
    }

    #[tokio::test]
    async fn test_list_combined_filters() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources?subject=database&search=SQL")).await;
        let list = response.json();

        assert_eq!(ids(&list), vec!["2"]);
        assert_eq!(list["totalCount"], 1);
    }

    #[tokio::test]
    async fn test_list_search_matches_tags() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources?search=cryptography")).await;

        assert_eq!(ids(&response.json()), vec!["6"]);
    }

    #[tokio::test]
    async fn test_list_unknown_category_is_ignored() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources?category=poetry&subject=")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["totalCount"], 6);
    }

    #[tokio::test]
    async fn test_list_no_match_is_empty() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources?search=quantum%20chromodynamics")).await;
        let list = response.json();

        assert_eq!(list["totalCount"], 0);
        assert!(list["resources"].as_array().unwrap().is_empty());
    }
}

#[cfg(test)]
mod resource_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_resource() {
        let server = TestServer::start().await;

        let response = get(&server.url("/api/resources/4")).await;

        assert_eq!(response.status, StatusCode::OK);
        let resource = response.json();
        assert_eq!(resource["title"], "Machine Learning Fundamentals");
        assert_eq!(resource["fileName"], "ml-fundamentals.pdf");
        assert_eq!(resource["fileSize"], 3_145_728);
        assert_eq!(resource["uploadedAt"], "2024-01-08T16:20:00Z");
    }

    #[tokio::test]
    async fn test_get_missing_resource() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources/999")).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json()["error"], "Resource not found");
    }

    #[tokio::test]
    async fn test_download_serves_pdf_and_counts() {
        let server = TestServer::start().await;

        let response = get(&server.url("/resources/1/download")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers[CONTENT_DISPOSITION],
            "attachment; filename=\"dsa-intro.pdf\""
        );
        assert!(response.body.starts_with(b"%PDF-"));

        let second = get(&server.url("/resources/1/download")).await;
        assert_eq!(second.status, StatusCode::OK);

        let resource = get(&server.url("/resources/1")).await.json();
        assert_eq!(resource["downloadCount"], 147);
    }

    #[tokio::test]
    async fn test_download_keeps_non_ascii_file_name() {
        let server = TestServer::start().await;
        let created = server
            .state
            .with_catalog(|catalog| {
                catalog.create(
                    CreateResourceRequest {
                        title: "Algèbre linéaire".to_string(),
                        category: Some(ResourceCategory::LectureNotes),
                        subject: "Mathématiques".to_string(),
                        ..Default::default()
                    },
                    FileDescriptor {
                        file_name: "Cours_Algèbre.pdf".to_string(),
                        size: 2048,
                        content_type: Some("application/pdf".to_string()),
                    },
                    "Dr. Smith",
                )
            })
            .unwrap();

        let response = get(&server.url(&format!("/resources/{}/download", created.id))).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers[CONTENT_DISPOSITION],
            "attachment; filename=\"Cours_Alg_bre.pdf\"; filename*=UTF-8''Cours_Alg%C3%A8bre.pdf"
        );
    }

    #[tokio::test]
    async fn test_download_missing_changes_nothing() {
        let server = TestServer::start().await;
        let before = get(&server.url("/resources")).await.json();

        let response = get(&server.url("/resources/nope/download")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let after = get(&server.url("/resources")).await.json();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_delete_resource() {
        let server = TestServer::start().await;

        let response = delete(&server.url("/resources/3")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["success"], true);
        assert_eq!(response.json()["message"], "Resource deleted successfully");

        let list = get(&server.url("/resources")).await.json();
        assert_eq!(ids(&list), vec!["1", "2", "4", "5", "6"]);

        assert_eq!(get(&server.url("/resources/3")).await.status, StatusCode::NOT_FOUND);
        assert_eq!(delete(&server.url("/resources/3")).await.status, StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod upload_tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_creates_resource() {
        let server = TestServer::start().await;
        let pdf = sample_pdf();
        let metadata = notes_metadata("Calculus I");

        let response = post_multipart(
            &server.url("/api/resources"),
            &[
                Part::File {
                    file_name: "calculus.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
                Part::Metadata(&metadata),
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Resource uploaded successfully");

        let resource = &body["resource"];
        assert_eq!(resource["title"], "Calculus I");
        assert_eq!(resource["fileName"], "calculus.pdf");
        assert_eq!(resource["fileSize"], pdf.len());
        assert_eq!(resource["downloadCount"], 0);
        assert_eq!(resource["uploadedBy"], "Current User");
        assert_eq!(resource["tags"], json!(["calculus", "limits"]));

        let id = resource["id"].as_str().unwrap();
        let list = get(&server.url("/resources")).await.json();
        assert_eq!(list["totalCount"], 7);
        assert_eq!(ids(&list).last().map(String::as_str), Some(id));
    }

    #[tokio::test]
    async fn test_upload_metadata_before_file() {
        let server = TestServer::start().await;
        let pdf = sample_pdf();
        let metadata = notes_metadata("Order Independent");

        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::Metadata(&metadata),
                Part::File {
                    file_name: "order.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["resource"]["title"], "Order Independent");
    }

    #[tokio::test]
    async fn test_upload_rejections_leave_catalog_unchanged() {
        let server = TestServer::start().await;
        let pdf = sample_pdf();
        let valid = notes_metadata("Valid");
        let missing_category = json!({"title": "No Category", "subject": "Maths"}).to_string();

        let cases: Vec<(Vec<Part>, &str)> = vec![
            (vec![Part::Metadata(&valid)], "No file provided"),
            (
                vec![
                    Part::File {
                        file_name: "x.pdf",
                        content_type: "application/pdf",
                        bytes: &pdf,
                    },
                    Part::Metadata("{not json"),
                ],
                "Invalid metadata format",
            ),
            (
                vec![
                    Part::File {
                        file_name: "x.pdf",
                        content_type: "application/pdf",
                        bytes: &pdf,
                    },
                    Part::Metadata(&missing_category),
                ],
                "Missing required metadata: title, category, and subject are required",
            ),
            (
                vec![
                    Part::File {
                        file_name: "x.docx",
                        content_type: "application/msword",
                        bytes: b"not a pdf",
                    },
                    Part::Metadata(&valid),
                ],
                "Only PDF files are allowed",
            ),
            (
                vec![
                    Part::File {
                        file_name: "empty.pdf",
                        content_type: "application/pdf",
                        bytes: b"",
                    },
                    Part::Metadata(&valid),
                ],
                "File is empty",
            ),
        ];

        for (parts, message) in cases {
            let response = post_multipart(&server.url("/resources"), &parts, None).await;

            assert_eq!(response.status, StatusCode::BAD_REQUEST, "case {:?}", message);
            let body = response.json();
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], message);
        }

        let list = get(&server.url("/resources")).await.json();
        assert_eq!(list["totalCount"], 6);
    }

    #[tokio::test]
    async fn test_upload_requires_multipart() {
        let server = TestServer::start().await;

        let response = post_json(&server.url("/resources"), &json!({"title": "x"}), None).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["success"], false);
    }

    #[tokio::test]
    async fn test_upload_over_limit_rejected() {
        let server = TestServer::with_config(Config {
            max_upload_bytes: 64,
            ..test_config()
        })
        .await;
        let big = vec![b'%'; 1024];
        let metadata = notes_metadata("Too Big");

        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::File {
                    file_name: "big.pdf",
                    content_type: "application/pdf",
                    bytes: &big,
                },
                Part::Metadata(&metadata),
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let message = response.json()["message"].as_str().unwrap().to_string();
        assert!(message.starts_with("File size must be less than"), "{}", message);
        assert_eq!(get(&server.url("/resources")).await.json()["totalCount"], 6);
    }

    #[tokio::test]
    async fn test_upload_oversized_metadata_rejected() {
        let server = TestServer::with_config(Config {
            max_upload_bytes: 1024,
            ..test_config()
        })
        .await;
        let pdf = sample_pdf();
        let metadata = json!({
            "title": "Huge",
            "description": "x".repeat(100_000),
            "category": "syllabus",
            "subject": "Padding"
        })
        .to_string();

        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::File {
                    file_name: "small.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
                Part::Metadata(&metadata),
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let message = response.json()["message"].as_str().unwrap().to_string();
        assert!(message.starts_with("Metadata must be less than"), "{}", message);
        assert_eq!(get(&server.url("/resources")).await.json()["totalCount"], 6);
    }

    #[tokio::test]
    async fn test_upload_oversized_body_rejected() {
        let server = TestServer::with_config(Config {
            max_upload_bytes: 1024,
            ..test_config()
        })
        .await;
        let pdf = sample_pdf();
        let metadata = notes_metadata("Padded");
        let padding = "p".repeat(100_000);

        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::File {
                    file_name: "small.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
                Part::Text {
                    name: "notes",
                    value: &padding,
                },
                Part::Metadata(&metadata),
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["message"], "Upload body is too large");
        assert_eq!(get(&server.url("/resources")).await.json()["totalCount"], 6);
    }

    #[tokio::test]
    async fn test_upload_null_optional_metadata() {
        let server = TestServer::start().await;
        let pdf = sample_pdf();
        let metadata = r#"{"title":"Nulls","category":"syllabus","subject":"S","description":null,"tags":null}"#;

        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::File {
                    file_name: "nulls.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
                Part::Metadata(metadata),
            ],
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        let resource = &response.json()["resource"];
        assert_eq!(resource["description"], "");
        assert_eq!(resource["tags"], json!([]));
    }

    #[tokio::test]
    async fn test_upload_by_logged_in_user() {
        let server = TestServer::start().await;
        let session = post_json(
            &server.url("/auth/login"),
            &json!({"email": "lecturer@demo.com", "password": "lecturer123"}),
            None,
        )
        .await
        .json();
        let token = session["token"].as_str().unwrap();

        let pdf = sample_pdf();
        let metadata = notes_metadata("Signed Upload");
        let response = post_multipart(
            &server.url("/resources"),
            &[
                Part::File {
                    file_name: "signed.pdf",
                    content_type: "application/pdf",
                    bytes: &pdf,
                },
                Part::Metadata(&metadata),
            ],
            Some(token),
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["resource"]["uploadedBy"], "Dr. Smith");
    }
}

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_session_logout() {
        let server = TestServer::start().await;

        let response = post_json(
            &server.url("/api/auth/login"),
            &json!({"email": "student@demo.com", "password": "student123"}),
            None,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        let session = response.json();
        assert_eq!(session["user"]["name"], "John Doe");
        assert_eq!(session["user"]["role"], "student");
        let token = session["token"].as_str().unwrap().to_string();

        let current = send(
            Request::get(server.url("/auth/session"))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(current.status, StatusCode::OK);
        assert_eq!(current.json()["email"], "student@demo.com");

        let logout = post_json(&server.url("/auth/logout"), &json!({}), Some(&token)).await;
        assert_eq!(logout.status, StatusCode::OK);

        let again = post_json(&server.url("/auth/logout"), &json!({}), Some(&token)).await;
        assert_eq!(again.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let server = TestServer::start().await;

        let response = post_json(
            &server.url("/auth/login"),
            &json!({"email": "student@demo.com", "password": "nope"}),
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json()["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_signup_and_duplicate() {
        let server = TestServer::start().await;
        let registration = json!({
            "name": "Grace Hopper",
            "email": "grace@uni.edu",
            "password": "cobol1959",
            "role": "lecturer"
        });

        let created = post_json(&server.url("/auth/signup"), &registration, None).await;
        assert_eq!(created.status, StatusCode::OK);
        assert_eq!(created.json()["user"]["role"], "lecturer");

        let duplicate = post_json(&server.url("/auth/signup"), &registration, None).await;
        assert_eq!(duplicate.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_malformed_body() {
        let server = TestServer::start().await;

        let response = send(
            Request::post(server.url("/auth/login"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\":"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let server = TestServer::start().await;

        let response = send(
            Request::builder()
                .method(Method::PUT)
                .uri(server.url("/resources/1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let server = TestServer::start().await;

        let response = get(&server.url("/library/shelves")).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json()["error"], "Not found");
    }
}

#[tokio::test]
async fn test_sqlite_catalog_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        storage: StorageBackend::Sqlite,
        db_path: dir.path().join("resources.db").to_str().unwrap().to_string(),
        ..test_config()
    };

    let first = TestServer::with_config(config.clone()).await;
    assert_eq!(delete(&first.url("/resources/6")).await.status, StatusCode::OK);
    assert_eq!(get(&first.url("/resources/2/download")).await.status, StatusCode::OK);

    let second = TestServer::with_config(config).await;
    let list = get(&second.url("/resources")).await.json();

    assert_eq!(ids(&list), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(list["resources"][1]["downloadCount"], 90);
}
