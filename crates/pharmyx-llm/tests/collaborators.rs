use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pharmyx_common::confidence::ConfidenceWeights;
use pharmyx_engine::{analyze, PgxTables};
use pharmyx_llm::{
    AdvisoryMapper, Explanation, ExplanationGenerator, ExplanationRequest, LlmBackend, LlmError,
    LlmRequest, LlmResponse,
};
use pharmyx_test_utils::cyp2c19_star2_vcf;
use pretty_assertions::assert_eq;

enum Reply {
    Content(&'static str),
    Fail,
    Hang,
}

struct MockBackend {
    reply: Reply,
    seen: Mutex<Vec<LlmRequest>>,
}

impl MockBackend {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self { reply, seen: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.seen.lock().unwrap().push(req);
        match self.reply {
            Reply::Content(c) => Ok(LlmResponse {
                content: c.to_string(),
                model: "mock".to_string(),
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
            Reply::Fail => Err(LlmError::ApiError { status: 503, message: "overloaded".into() }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(LlmError::Unavailable("unreachable".into()))
            }
        }
    }

    fn model_id(&self) -> &str { "mock" }
    fn name(&self) -> &str { "mock" }
    fn is_local(&self) -> bool { true }
}

fn request() -> ExplanationRequest {
    let tables = PgxTables::builtin().unwrap();
    let analysis = analyze(&cyp2c19_star2_vcf(), "clopidogrel", tables, &ConfidenceWeights::default()).unwrap();
    ExplanationRequest::from_analysis(&analysis)
}

#[test]
fn test_request_from_analysis() {
    let req = request();
    assert_eq!(req.gene, "CYP2C19");
    assert_eq!(req.phenotype, "IM");
    assert_eq!(req.diplotype, "*1/*2");
    assert_eq!(req.rsids, vec!["rs4244285".to_string()]);
    assert_eq!(req.drug, "clopidogrel");
    assert!(req.guideline.unwrap().contains("Consider alternative therapy or monitor closely."));
}

#[tokio::test]
async fn test_structured_reply() {
    let backend = MockBackend::new(Reply::Content(
        r#"{"summary":"Reduced activation.","mechanism":"CYP2C19 converts the prodrug.","clinical_impact":"Lower platelet inhibition."}"#,
    ));
    let generator = ExplanationGenerator::new(backend.clone(), Duration::from_secs(2));
    let e = generator.explain(&request()).await;

    assert!(e.success);
    assert_eq!(e.summary, "Reduced activation.");
    assert_eq!(e.clinical_impact, "Lower platelet inhibition.");

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].json_mode);
    assert_eq!(seen[0].temperature, Some(0.2));
    assert_eq!(seen[0].top_p, Some(0.9));
    assert!(seen[0].messages[1].content.contains("rs4244285"));
}

#[tokio::test]
async fn test_backend_error_falls_back() {
    let generator = ExplanationGenerator::new(MockBackend::new(Reply::Fail), Duration::from_secs(2));
    assert_eq!(generator.explain(&request()).await, Explanation::fallback());
}

#[tokio::test]
async fn test_empty_reply_falls_back() {
    let generator = ExplanationGenerator::new(MockBackend::new(Reply::Content("  ")), Duration::from_secs(2));
    let e = generator.explain(&request()).await;
    assert!(!e.success);
    assert_eq!(e.summary, "LLM unavailable. Pharmacogenomic interaction detected.");
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let generator = ExplanationGenerator::new(MockBackend::new(Reply::Hang), Duration::from_millis(50));
    let e = generator.explain(&request()).await;
    assert!(!e.success);
    assert_eq!(e.mechanism, "Metabolic pathway affected based on phenotype.");
}

#[tokio::test]
async fn test_disabled_generator() {
    let generator = ExplanationGenerator::disabled();
    assert!(!generator.is_enabled());
    assert_eq!(generator.explain(&request()).await, Explanation::fallback());
}

#[tokio::test]
async fn test_advisory_mapper() {
    let tables = PgxTables::builtin().unwrap();
    let analysis = analyze(&cyp2c19_star2_vcf(), "clopidogrel", tables, &ConfidenceWeights::default()).unwrap();

    let ok = AdvisoryMapper::new(
        MockBackend::new(Reply::Content(
            r#"{"gene_results":[{"gene":"CYP2C19","diplotype":"*1/*2","phenotype":"PM","confidence_score":0.6}]}"#,
        )),
        Duration::from_secs(2),
    );
    let report = ok.map(&analysis.variants).await;
    assert!(report.success);
    assert!(report.non_authoritative);
    assert_eq!(report.results[0].phenotype, "PM");
    // The deterministic call is untouched by a disagreeing advisory.
    assert_eq!(analysis.primary_phenotype().as_str(), "IM");

    let failing = AdvisoryMapper::new(MockBackend::new(Reply::Hang), Duration::from_millis(50));
    let report = failing.map(&analysis.variants).await;
    assert!(!report.success);
    assert!(report.results.is_empty());
}
