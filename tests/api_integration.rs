//! Integration tests for the HTTP client and the quiz flow.
//!
//! Each test spins up an Axum stub of the recommendation service on a
//! random port and drives the real reqwest client (and controller) against it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use perfume_quiz::api::{HttpApiClient, RecommendationApi};
use perfume_quiz::error::{ApiError, NETWORK_MESSAGE};
use perfume_quiz::quiz::{FlowPhase, FlowState, QuestionKind, QuizController, RecoveryAction};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Request bodies received by the stub's recommend endpoint.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<Value>>>);

impl Captured {
    fn bodies(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }
}

/// Start a stub server on a random port, return its base URL.
async fn start_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

fn option(valor: &str, label: &str) -> Value {
    json!({ "valor": valor, "label": label })
}

/// The service's question list, options trimmed.
fn questions_json() -> Value {
    let select = |id: &str, values: &[&str], required: bool| {
        json!({
            "id": id,
            "pergunta": format!("Pergunta sobre {id}"),
            "tipo": "select",
            "opcoes": values.iter().map(|v| option(v, &v.to_uppercase())).collect::<Vec<_>>(),
            "obrigatoria": required
        })
    };
    json!({
        "titulo": "Quiz de Perfumes - JA Essence de la Vie",
        "descricao": "Descubra o perfume ideal para você!",
        "perguntas": [
            select("genero", &["masculino", "feminino", "unissex", "qualquer"], true),
            select("ocasiao", &["noite", "trabalho"], true),
            select("estacao", &["inverno", "verao"], true),
            select("intensidade", &["intensa", "leve"], true),
            select("familia_olfativa", &["amadeirado", "floral"], true),
            select("personalidade", &["sofisticado", "moderno"], true),
            select("faixa_preco", &["ate_130", "qualquer"], false),
            {
                "id": "notas_preferidas",
                "pergunta": "Tem alguma nota olfativa que você adora?",
                "descricao": "Opcional - selecione suas notas favoritas",
                "tipo": "multiselect",
                "opcoes": [option("baunilha", "Baunilha"), option("ambar", "Âmbar")],
                "obrigatoria": false
            },
            {
                "id": "notas_evitar",
                "pergunta": "Tem alguma nota que você NÃO gosta?",
                "tipo": "multiselect",
                "opcoes": [option("oud", "Oud"), option("incenso", "Incenso")],
                "obrigatoria": false
            },
            {
                "id": "observacoes",
                "pergunta": "Alguma observação adicional?",
                "tipo": "text",
                "opcoes": null,
                "obrigatoria": false
            }
        ]
    })
}

fn recommendations_json() -> Value {
    let perfume = |nome: &str, score: f64| {
        json!({
            "nome": nome,
            "categoria": "masculinos",
            "preco": "R$ 149,90",
            "preco_pix": "R$ 134,91",
            "notas_topo": "Bergamota",
            "match_score": score,
            "motivo_recomendacao": format!("{nome} combina com a noite")
        })
    };
    json!({
        "sucesso": true,
        "mensagem": "Recomendações geradas com sucesso!",
        "perfil_usuario": "Sofisticado, intenso e noturno",
        "recomendacoes": [perfume("Noir", 72.0), perfume("Ambre", 95.5), perfume("Cuir", 88.0)],
        "dica_extra": "Aplique nos pulsos"
    })
}

async fn recommend(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    captured.0.lock().unwrap().push(body);
    Json(recommendations_json())
}

/// Stub that serves questions and records recommend bodies.
fn happy_app(captured: Captured) -> Router {
    Router::new()
        .route("/quiz/questions", get(|| async { Json(questions_json()) }))
        .route("/quiz/recommend", post(recommend))
        .route(
            "/health",
            get(|| async {
                Json(json!({
                    "status": "ok",
                    "version": "1.0.0",
                    "gemini_configured": true,
                    "perfumes_loaded": 42
                }))
            }),
        )
        .with_state(captured)
}

/// Stub whose recommend endpoint always answers with `status` and `body`.
fn failing_recommend_app(status: StatusCode, body: &'static str) -> Router {
    Router::new()
        .route("/quiz/questions", get(|| async { Json(questions_json()) }))
        .route("/quiz/recommend", post(move || async move { (status, body) }))
}

/// Answer each required question with its first option, walking to the end.
fn answer_required_and_walk(controller: &mut QuizController) {
    loop {
        let question = controller
            .state()
            .as_active()
            .and_then(|quiz| quiz.current_question())
            .cloned()
            .expect("quiz should be active");
        if question.required {
            controller.select_option(&question.options[0].value).unwrap();
        }
        if !controller.advance().unwrap() {
            break;
        }
    }
}

async fn loaded_controller(base_url: &str) -> QuizController {
    let api: Arc<dyn RecommendationApi> = Arc::new(HttpApiClient::new(base_url));
    let mut controller = QuizController::new(api);
    controller.load().await.unwrap();
    controller
}

// ── Client ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_questions_maps_wire_shape() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(happy_app(Captured::default())).await;
        let client = HttpApiClient::new(&base);

        let set = client.fetch_questions().await.unwrap();
        assert_eq!(set.title, "Quiz de Perfumes - JA Essence de la Vie");
        assert_eq!(set.len(), 10);
        assert_eq!(set.get(0).unwrap().id, "genero");
        assert_eq!(set.find("notas_preferidas").unwrap().kind, QuestionKind::MultiChoice);
        assert_eq!(set.find("observacoes").unwrap().kind, QuestionKind::FreeText);
        assert!(!set.find("faixa_preco").unwrap().required);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_check_decodes_status() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(happy_app(Captured::default())).await;
        let health = HttpApiClient::new(&base).health_check().await.unwrap();
        assert!(health.is_ok());
        assert!(health.gemini_configured);
        assert_eq!(health.perfumes_loaded, 42);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_endpoint_is_a_server_error() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Router::new()).await;
        let err = HttpApiClient::new(&base).fetch_questions().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                message: "Erro 404".to_string()
            }
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    timeout(TEST_TIMEOUT, async {
        // Bind and drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = HttpApiClient::new(format!("http://127.0.0.1:{port}"))
            .fetch_questions()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
    })
    .await
    .expect("test timed out");
}

// ── Flow ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_quiz_posts_defaults_and_keeps_rank_order() {
    timeout(TEST_TIMEOUT, async {
        let captured = Captured::default();
        let base = start_server(happy_app(captured.clone())).await;
        let mut controller = loaded_controller(&base).await;

        answer_required_and_walk(&mut controller);
        controller.submit().await.unwrap();

        assert_eq!(
            captured.bodies(),
            vec![json!({
                "genero": "masculino",
                "ocasiao": "noite",
                "estacao": "inverno",
                "intensidade": "intensa",
                "familia_olfativa": "amadeirado",
                "personalidade": "sofisticado",
                "faixa_preco": "qualquer"
            })]
        );

        let result = controller.state().result().expect("should be in Result");
        let names: Vec<&str> = result.recommendations.iter().map(|r| r.nome.as_str()).collect();
        assert_eq!(names, vec!["Noir", "Ambre", "Cuir"]);
        assert_eq!(result.profile, "Sofisticado, intenso e noturno");
        assert_eq!(result.extra_tip.as_deref(), Some("Aplique nos pulsos"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn optional_answers_are_sent_when_given() {
    timeout(TEST_TIMEOUT, async {
        let captured = Captured::default();
        let base = start_server(happy_app(captured.clone())).await;
        let mut controller = loaded_controller(&base).await;

        for _ in 0..6 {
            let value = controller
                .state()
                .as_active()
                .and_then(|quiz| quiz.current_question())
                .map(|q| q.options[0].value.clone())
                .unwrap();
            controller.select_option(&value).unwrap();
            controller.advance().unwrap();
        }
        controller.select_option("ate_130").unwrap();
        controller.advance().unwrap();
        controller.select_option("ambar").unwrap();
        controller.select_option("baunilha").unwrap();
        controller.advance().unwrap();
        controller.advance().unwrap();
        controller.enter_text("Algo marcante").unwrap();
        controller.submit().await.unwrap();

        let body = &captured.bodies()[0];
        assert_eq!(body["faixa_preco"], "ate_130");
        assert_eq!(body["notas_preferidas"], json!(["ambar", "baunilha"]));
        assert!(body.get("notas_evitar").is_none());
        assert_eq!(body["observacoes"], "Algo marcante");
        assert_eq!(controller.phase(), FlowPhase::Result);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn validation_detail_becomes_failure_message() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(failing_recommend_app(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "campo obrigatório"}"#,
        ))
        .await;
        let mut controller = loaded_controller(&base).await;

        answer_required_and_walk(&mut controller);
        controller.submit().await.unwrap();

        assert_eq!(controller.state().failure_message(), Some("campo obrigatório"));
        assert!(matches!(
            controller.state(),
            FlowState::Failed {
                recovery: RecoveryAction::ResumeQuiz { .. },
                ..
            }
        ));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unparseable_server_error_falls_back_to_status() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(failing_recommend_app(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>Internal Server Error</html>",
        ))
        .await;
        let mut controller = loaded_controller(&base).await;

        answer_required_and_walk(&mut controller);
        controller.submit().await.unwrap();

        assert_eq!(controller.state().failure_message(), Some("Erro 500"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn erro_field_is_surfaced() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(failing_recommend_app(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"sucesso": false, "erro": "Erro ao processar recomendações: quota", "detalhes": null}"#,
        ))
        .await;
        let mut controller = loaded_controller(&base).await;

        answer_required_and_walk(&mut controller);
        controller.submit().await.unwrap();

        assert_eq!(
            controller.state().failure_message(),
            Some("Erro ao processar recomendações: quota")
        );

        controller.recover().await.unwrap();
        assert_eq!(controller.phase(), FlowPhase::Active);
        assert!(controller.state().as_active().unwrap().is_last_question());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn empty_question_list_is_active_and_submittable() {
    timeout(TEST_TIMEOUT, async {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/quiz/questions",
                get(|| async { Json(json!({ "titulo": "Vazio", "descricao": "", "perguntas": [] })) }),
            )
            .route("/quiz/recommend", post(recommend))
            .with_state(captured.clone());
        let base = start_server(app).await;
        let mut controller = loaded_controller(&base).await;

        let quiz = controller.state().as_active().unwrap();
        assert_eq!(quiz.index, 0);
        assert!(quiz.current_question().is_none());
        assert!(controller.can_advance());

        controller.submit().await.unwrap();
        assert_eq!(captured.bodies(), vec![json!({ "faixa_preco": "qualquer" })]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_questions_fail_the_load() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route(
            "/quiz/questions",
            get(|| async {
                Json(json!({
                    "titulo": "Quiz",
                    "descricao": "",
                    "perguntas": [{ "id": "genero", "pergunta": "?", "tipo": "select", "obrigatoria": true }]
                }))
            }),
        );
        let base = start_server(app).await;

        let api: Arc<dyn RecommendationApi> = Arc::new(HttpApiClient::new(&base));
        let mut controller = QuizController::new(api);
        controller.load().await.unwrap();

        assert_eq!(controller.phase(), FlowPhase::Failed);
        assert!(controller.state().failure_message().unwrap().contains("genero"));
        assert!(matches!(
            controller.state(),
            FlowState::Failed {
                recovery: RecoveryAction::ReloadQuestions,
                ..
            }
        ));
    })
    .await
    .expect("test timed out");
}
