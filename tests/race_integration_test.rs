use anyhow::Result;
use cep_race::config::toml_config::TomlConfig;
use cep_race::{CepError, RacePolicy, RequestHandler};
use httpmock::prelude::*;
use std::time::{Duration, Instant};

fn brasil_api_body() -> serde_json::Value {
    serde_json::json!({
        "cep": "01001000",
        "state": "SP",
        "city": "São Paulo",
        "neighborhood": "Sé",
        "street": "Praça da Sé",
        "service": "open-cep"
    })
}

fn via_cep_body() -> serde_json::Value {
    serde_json::json!({
        "cep": "01001-000",
        "logradouro": "Praça da Sé",
        "complemento": "lado ímpar",
        "bairro": "Sé",
        "localidade": "São Paulo",
        "uf": "SP"
    })
}

/// 兩個來源都指向同一個 mock server，用路徑區分
fn config_for(server: &MockServer, timeout_ms: u64, policy: RacePolicy) -> Result<TomlConfig> {
    let config = TomlConfig::from_toml_str(&format!(
        r#"
[race]
timeout_ms = {timeout_ms}
policy = "{policy}"

[[sources]]
kind = "brasil_api"
base_url = "{base}"

[[sources]]
kind = "via_cep"
base_url = "{base}"
"#,
        base = server.base_url()
    ))?;
    Ok(config)
}

#[tokio::test]
async fn test_fast_source_wins_while_slow_one_is_abandoned() -> Result<()> {
    let server = MockServer::start();
    let brasil_mock = server.mock(|when, then| {
        when.method(GET).path("/api/cep/v1/01001000");
        then.status(200)
            .header("Content-Type", "application/json")
            .delay(Duration::from_millis(50))
            .json_body(brasil_api_body());
    });
    server.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200)
            .delay(Duration::from_secs(2))
            .json_body(via_cep_body());
    });

    let config = config_for(&server, 1000, RacePolicy::WaitForSuccess)?;
    let handler = RequestHandler::from_config(&config)?;

    let started = Instant::now();
    let winner = handler.handle(Some("01001000")).await?;

    brasil_mock.assert();
    assert_eq!(winner.source, "BrasilAPI");
    assert_eq!(winner.payload.city(), "São Paulo");
    assert!(started.elapsed() < Duration::from_secs(1));
    Ok(())
}

#[tokio::test]
async fn test_both_slow_sources_time_out_near_deadline() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/cep/v1/01001000");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(brasil_api_body());
    });
    server.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(via_cep_body());
    });

    let config = config_for(&server, 300, RacePolicy::WaitForSuccess)?;
    let handler = RequestHandler::from_config(&config)?;

    let started = Instant::now();
    let err = handler.handle(Some("01001000")).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, CepError::Timeout { deadline_ms: 300 }));
    assert_eq!(err.status_code(), 504);
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(1500));
    Ok(())
}

#[tokio::test]
async fn test_early_failure_does_not_end_race_by_default() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/cep/v1/01001000");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200)
            .delay(Duration::from_millis(200))
            .json_body(via_cep_body());
    });

    let config = config_for(&server, 2000, RacePolicy::WaitForSuccess)?;
    let handler = RequestHandler::from_config(&config)?;

    let winner = handler.handle(Some("01001000")).await?;
    assert_eq!(winner.source, "ViaCEP");
    assert_eq!(winner.payload.region(), "SP");
    Ok(())
}

#[tokio::test]
async fn test_fail_fast_policy_stops_on_first_failure() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/cep/v1/01001000");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(via_cep_body());
    });

    let config = config_for(&server, 2000, RacePolicy::FailFast)?;
    let handler = RequestHandler::from_config(&config)?;

    match handler.handle(Some("01001000")).await {
        Err(err @ CepError::FirstResponseFailed { .. }) => {
            assert!(err.user_friendly_message().contains("BrasilAPI"));
            if let CepError::FirstResponseFailed { failure } = err {
                assert_eq!(failure.source, "BrasilAPI");
            }
        }
        other => panic!("expected fail-fast failure, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_all_sources_failing_is_distinct_from_timeout() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/cep/v1/01001000");
        then.status(200).body("not json");
    });
    server.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200).json_body(serde_json::json!({"erro": true}));
    });

    let config = config_for(&server, 2000, RacePolicy::WaitForSuccess)?;
    let handler = RequestHandler::from_config(&config)?;

    let started = Instant::now();
    let err = handler.handle(Some("01001000")).await.unwrap_err();

    match &err {
        CepError::Unresolved { failures } => {
            let mut sources: Vec<&str> = failures.iter().map(|f| f.source.as_str()).collect();
            sources.sort();
            assert_eq!(sources, vec!["BrasilAPI", "ViaCEP"]);
        }
        other => panic!("expected unresolved, got {:?}", other),
    }
    assert_eq!(err.status_code(), 502);
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn test_missing_postal_code_sends_no_requests() -> Result<()> {
    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200).json_body(brasil_api_body());
    });

    let config = config_for(&server, 1000, RacePolicy::WaitForSuccess)?;
    let handler = RequestHandler::from_config(&config)?;

    let err = handler.handle(None).await.unwrap_err();
    assert!(matches!(err, CepError::MissingPostalCode));
    any_mock.assert_hits(0);
    Ok(())
}
