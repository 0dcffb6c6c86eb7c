/*!
 * Tests for the Ollama client and the translation service built on it
 */

use anyhow::Result;
use booktrans::app_config::Config;
use booktrans::errors::TranslationError;
use booktrans::providers::ollama::{ChatMessage, ChatRequest};
use booktrans::translation::core::{TranslationService, Translator};

#[test]
fn test_chatRequest_withOptions_shouldSerializeOllamaFields() -> Result<()> {
    let request = ChatRequest::new(
        "llama3.2:3b",
        vec![ChatMessage::system("You translate."), ChatMessage::user("Hello")],
    )
    .temperature(0.5)
    .no_stream();

    let json = serde_json::to_value(&request)?;

    assert_eq!(json["model"], "llama3.2:3b");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["content"], "Hello");
    assert_eq!(json["options"]["temperature"], 0.5);
    assert_eq!(json["stream"], false);
    Ok(())
}

#[test]
fn test_chatRequest_withoutOptions_shouldOmitThem() -> Result<()> {
    let request = ChatRequest::new("m", vec![ChatMessage::user("Hi")]);

    let json = serde_json::to_value(&request)?;

    assert!(json.get("options").is_none());
    assert!(json.get("stream").is_none());
    Ok(())
}

fn unreachable_config() -> Config {
    let mut config = Config::default();
    // Nothing listens on the discard port
    config.translation.provider.endpoint = "http://127.0.0.1:9".to_string();
    config.translation.provider.max_retries = 0;
    config.translation.provider.timeout_secs = 5;
    config
}

#[test]
fn test_translate_withEmptyInput_shouldNotContactServer() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let service = TranslationService::new(&unreachable_config(), runtime.handle().clone())?;

    let translations = service.translate(&[])?;

    assert!(translations.is_empty());
    Ok(())
}

#[test]
fn test_translate_withUnreachableServer_shouldReturnError() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let service = TranslationService::new(&unreachable_config(), runtime.handle().clone())?;

    let result = service.translate(&["Hello".to_string()]);

    assert!(matches!(
        result,
        Err(TranslationError::Provider(_)) | Err(TranslationError::Timeout(_))
    ));
    Ok(())
}

#[test]
fn test_testConnection_withUnreachableServer_shouldFail() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let service = TranslationService::new(&unreachable_config(), runtime.handle().clone())?;

    assert!(service.test_connection().is_err());
    Ok(())
}
