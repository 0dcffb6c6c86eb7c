/*!
 * Tests for the translation memory
 */

use anyhow::Result;
use booktrans::translation::cache::{TranslationMemory, hash_text};

use crate::common;

#[test]
fn test_get_afterSave_shouldReturnStoredTranslation() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;

    memory.save("Hello world", "Hola mundo")?;

    assert_eq!(memory.get("Hello world"), Some("Hola mundo".to_string()));
    Ok(())
}

#[test]
fn test_save_withSameSourceTwice_shouldKeepLastTranslation() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;

    memory.save("Good morning", "Buenos dias")?;
    memory.save("Good morning", "Buen dia")?;

    assert_eq!(memory.get("Good morning"), Some("Buen dia".to_string()));
    assert_eq!(memory.len()?, 1);
    Ok(())
}

#[test]
fn test_get_withRepeatedLookups_shouldBeIdempotent() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;
    memory.save("The end", "Fin")?;

    let first = memory.get("The end");
    let second = memory.get("The end");

    assert_eq!(first, second);
    assert_eq!(memory.len()?, 1);
    Ok(())
}

#[test]
fn test_get_withSurroundingWhitespace_shouldHitNormalizedEntry() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;

    memory.save("  It was a dark night.\n", "Era una noche oscura.")?;

    assert_eq!(
        memory.get("It was a dark night."),
        Some("Era una noche oscura.".to_string())
    );
    assert_eq!(
        memory.get("\tIt was a dark night.   "),
        Some("Era una noche oscura.".to_string())
    );
    assert_eq!(hash_text(" a "), hash_text("a"));
    Ok(())
}

#[test]
fn test_get_withDifferentCase_shouldMiss() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;
    memory.save("Hello", "Hola")?;

    assert!(memory.get("hello").is_none());
    Ok(())
}

#[test]
fn test_open_withExistingFile_shouldPersistAcrossReopen() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("nested").join("memory.db");

    {
        let memory = TranslationMemory::open(&db_path)?;
        memory.save("Chapter One", "Capitulo uno")?;
        memory.close()?;
    }

    let reopened = TranslationMemory::open(&db_path)?;
    assert_eq!(reopened.get("Chapter One"), Some("Capitulo uno".to_string()));
    assert_eq!(reopened.stats().hits, 1);
    assert_eq!(reopened.stats().writes, 0);
    Ok(())
}

#[test]
fn test_get_withUnicodeText_shouldRoundTrip() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;

    memory.save("こんにちは世界", "Hola, mundo 🌍")?;

    assert_eq!(memory.get("こんにちは世界"), Some("Hola, mundo 🌍".to_string()));
    Ok(())
}

#[test]
fn test_isEmpty_withFreshStore_shouldBeTrue() -> Result<()> {
    let memory = TranslationMemory::open_in_memory()?;

    assert!(memory.is_empty()?);
    memory.save("a", "b")?;
    assert!(!memory.is_empty()?);
    Ok(())
}
