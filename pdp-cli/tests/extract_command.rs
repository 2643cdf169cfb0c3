#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pdp_cli::commands::{compare, extract, Settings};
use pdp_cli::CliError;
use pdp_extract::extraction::ExtractionConfig;
use pdp_extract::gateway::{
    AiGateway, GatewayError, GatewayResponse, Message, OutputSchema, TokenUsage,
};
use pdp_extract::sink::CsvSink;
use serde_json::json;

const CATEGORY: &str = "Hardware > Tools > Drills";

/// Answers the category phase with a fixed category and the product phase
/// with a product named after the page heading.
#[derive(Default)]
struct PageEcho {
    calls: AtomicUsize,
}

#[async_trait]
impl AiGateway for PageEcho {
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> Result<GatewayResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = &messages[1].content;
        let name = page
            .split("<h1>")
            .nth(1)
            .and_then(|rest| rest.split("</h1>").next())
            .unwrap_or("Unknown")
            .to_string();

        let data = if schema.name == "Category" {
            json!({"name": CATEGORY})
        } else {
            json!({
                "name": name,
                "price": {"price": 89.0, "currency": "USD"},
                "description": "Cordless drill",
                "key_features": ["18V"],
                "image_urls": [],
                "video_url": null,
                "category": {"name": CATEGORY},
                "brand": "Acme",
                "colors": [],
                "variants": []
            })
        };

        Ok(GatewayResponse {
            data,
            usage: TokenUsage {
                input_tokens: 1000,
                output_tokens: 100,
                reasoning_tokens: 0,
            },
            model: model.to_string(),
        })
    }
}

fn settings(dir: &Path) -> Settings {
    let data_dir = dir.join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    let categories = dir.join("categories.txt");
    std::fs::write(&categories, format!("# taxonomy\n{CATEGORY}\nHardware > Tools\n")).unwrap();

    Settings {
        data_dir,
        categories,
        config: ExtractionConfig::default(),
    }
}

fn write_page(settings: &Settings, file: &str, heading: &str) {
    std::fs::write(
        settings.data_dir.join(file),
        format!("<html><body><nav>Menu</nav><h1>{heading}</h1></body></html>"),
    )
    .unwrap();
}

#[tokio::test]
async fn extracts_every_page_into_the_default_csv() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    write_page(&settings, "makita.html", "Makita DHP482");
    write_page(&settings, "bosch.html", "Bosch GSR 18V");

    let gateway = Arc::new(PageEcho::default());
    let summary = extract::run(&settings, gateway.clone(), None, None)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, vec!["bosch.html", "makita.html"]);
    assert!(summary.failed.is_empty());
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 4);

    let sink = CsvSink::new(settings.data_dir.join(extract::DEFAULT_OUTPUT));
    let records = sink.records().await.unwrap();
    assert_eq!(records.len(), 2);
    let makita = records.iter().find(|r| r.filename == "makita.html").unwrap();
    assert_eq!(makita.name, "Makita DHP482");
    assert_eq!(makita.category, CATEGORY);
}

#[tokio::test]
async fn rerunning_one_file_replaces_its_row() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    write_page(&settings, "makita.html", "Makita DHP482");
    let out = dir.path().join("out").join("rows.csv");

    extract::run(
        &settings,
        Arc::new(PageEcho::default()),
        Some(Path::new("makita.html")),
        Some(out.clone()),
    )
    .await
    .unwrap();
    write_page(&settings, "makita.html", "Makita DHP482Z");
    extract::run(
        &settings,
        Arc::new(PageEcho::default()),
        Some(Path::new("makita.html")),
        Some(out.clone()),
    )
    .await
    .unwrap();

    let records = CsvSink::new(out).records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Makita DHP482Z");
}

#[tokio::test]
async fn empty_data_dir_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let gateway = Arc::new(PageEcho::default());

    let summary = extract::run(&settings, gateway.clone(), None, None)
        .await
        .unwrap();

    assert_eq!(summary.total(), 0);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    assert!(!settings.data_dir.join(extract::DEFAULT_OUTPUT).exists());
}

#[tokio::test]
async fn compare_writes_one_record_per_model() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    write_page(&settings, "makita.html", "Makita DHP482");
    let out = dir.path().join("results.json");
    let models = vec!["openai/gpt-5-nano".to_string(), "unknown/model".to_string()];

    let records = compare::run(
        &settings,
        Arc::new(PageEcho::default()),
        None,
        &models,
        &out,
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.error.is_none()));
    assert!(records[0].cost_usd > 0.0);
    assert!(records[1].cost_usd.abs() < f64::EPSILON);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written[1]["model"], "unknown/model");
    assert_eq!(written[0]["product"]["name"], "Makita DHP482");
    assert!(!settings.data_dir.join(extract::DEFAULT_OUTPUT).exists());
}

#[tokio::test]
async fn out_of_range_settings_fail_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    write_page(&settings, "makita.html", "Makita DHP482");
    settings.config = settings.config.with_budget_usd(f64::NAN);
    let gateway = Arc::new(PageEcho::default());

    let err = extract::run(&settings, gateway.clone(), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}
