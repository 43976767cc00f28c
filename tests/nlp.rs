//! Intent classification and entity extraction integration tests

use std::sync::Arc;

use aria_assistant::nlp::{Entities, EntityExtractor, Intent, IntentCatalog, IntentClassifier};
use aria_assistant::{HashEmbedder, TextEmbedder};

mod common;
use common::{CountingEmbedder, StubEmbedder};

fn builtin_classifier() -> IntentClassifier {
    IntentClassifier::new(Arc::new(HashEmbedder::default()), 0.4).unwrap()
}

#[test]
fn empty_and_whitespace_short_circuit_without_embedding() {
    let embedder = Arc::new(CountingEmbedder::new());
    let classifier =
        IntentClassifier::new(Arc::clone(&embedder) as Arc<dyn TextEmbedder>, 0.4).unwrap();
    let calls_after_build = embedder.calls();

    for text in ["", "   ", " \t \n "] {
        let result = classifier.classify(text).unwrap();
        assert_eq!(result.intent, Intent::Unknown);
        assert!((result.confidence - 0.0).abs() < f32::EPSILON);
    }

    // The embedding model was never invoked for the empty inputs
    assert_eq!(embedder.calls(), calls_after_build);
}

#[test]
fn below_threshold_reports_the_true_maximum_score() {
    // Unit vectors with a known angle: the query scores exactly 0.5
    // against the closest intent, under the 0.6 threshold
    let embedder = StubEmbedder::new(&[
        ("turn on the light", &[1.0, 0.0, 0.0]),
        ("tell me a joke", &[0.0, 1.0, 0.0]),
        ("dim the lamp", &[0.5, 0.0, 0.866_025]),
    ]);

    let mut catalog = IntentCatalog::new();
    catalog.add(Intent::LightOn, vec!["turn on the light".to_string()]);
    catalog.add(Intent::Joke, vec!["tell me a joke".to_string()]);

    let classifier = IntentClassifier::with_catalog(Arc::new(embedder), 0.6, &catalog).unwrap();

    let result = classifier.classify("dim the lamp").unwrap();
    assert_eq!(result.intent, Intent::Unknown);
    // The close miss is still reported, not zeroed
    assert!((result.confidence - 0.5).abs() < 0.001);
}

#[test]
fn at_or_above_threshold_classifies() {
    let embedder = StubEmbedder::new(&[
        ("turn on the light", &[1.0, 0.0, 0.0]),
        ("lights please", &[0.8, 0.0, 0.6]),
    ]);

    let mut catalog = IntentCatalog::new();
    catalog.add(Intent::LightOn, vec!["turn on the light".to_string()]);

    let classifier = IntentClassifier::with_catalog(Arc::new(embedder), 0.6, &catalog).unwrap();

    let result = classifier.classify("lights please").unwrap();
    assert_eq!(result.intent, Intent::LightOn);
    assert!((result.confidence - 0.8).abs() < 0.001);
}

#[test]
fn ties_break_to_the_first_intent_in_catalog_order() {
    // Both intents share an identical example embedding
    let embedder = StubEmbedder::new(&[
        ("phrase a", &[1.0, 0.0]),
        ("phrase b", &[1.0, 0.0]),
        ("query", &[1.0, 0.0]),
    ]);

    let mut catalog = IntentCatalog::new();
    catalog.add(Intent::Greet, vec!["phrase a".to_string()]);
    catalog.add(Intent::Goodbye, vec!["phrase b".to_string()]);

    let classifier = IntentClassifier::with_catalog(Arc::new(embedder), 0.4, &catalog).unwrap();

    let result = classifier.classify("query").unwrap();
    assert_eq!(result.intent, Intent::Greet);
}

#[test]
fn classification_is_idempotent_on_an_unmutated_catalog() {
    let classifier = builtin_classifier();

    let first = classifier.classify("what's the weather like").unwrap();
    let second = classifier.classify("what's the weather like").unwrap();

    assert_eq!(first.intent, second.intent);
    assert!((first.confidence - second.confidence).abs() < f32::EPSILON);
}

#[test]
fn add_examples_round_trips_through_classify() {
    let classifier = builtin_classifier();
    let custom = Intent::Custom("custom_intent".to_string());

    classifier
        .add_examples(custom.clone(), ["zorp the blorple"])
        .unwrap();

    let result = classifier.classify("zorp the blorple").unwrap();
    assert_eq!(result.intent, custom);
    assert!(result.confidence >= classifier.threshold());
}

#[test]
fn add_examples_extends_an_existing_intent() {
    let classifier = builtin_classifier();

    classifier
        .add_examples(Intent::Joke, ["crack a funny one"])
        .unwrap();

    let result = classifier.classify("crack a funny one").unwrap();
    assert_eq!(result.intent, Intent::Joke);
    assert!(result.confidence > 0.99);
}

#[test]
fn concurrent_classification_and_mutation_stay_consistent() {
    let classifier = Arc::new(builtin_classifier());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let result = classifier.classify("tell me a joke").unwrap();
                    assert_eq!(result.intent, Intent::Joke);
                }
            })
        })
        .collect();

    for i in 0..10 {
        classifier
            .add_examples(
                Intent::Custom("stress".to_string()),
                [format!("stress phrase number {i}")],
            )
            .unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

// Entity extraction, the spec's worked examples

#[test]
fn room_is_extracted_for_light_commands() {
    let entities = EntityExtractor::new().extract("turn on the bedroom light", &Intent::LightOn);

    assert_eq!(
        entities,
        Entities {
            room: Some("bedroom".to_string()),
            ..Entities::default()
        }
    );
}

#[test]
fn number_is_extracted_for_temperature_commands() {
    let entities =
        EntityExtractor::new().extract("set temperature to 72", &Intent::TemperatureSet);

    assert_eq!(
        entities,
        Entities {
            number: Some(72),
            ..Entities::default()
        }
    );
}

#[test]
fn gated_slots_stay_absent_outside_their_intent() {
    let extractor = EntityExtractor::new();

    // Weather words under a non-weather intent
    let entities = extractor.extract("weather in london tomorrow", &Intent::Greet);
    assert_eq!(entities.city, None);
    assert_eq!(entities.forecast, None);

    // Reminder phrasing under a non-reminder intent
    let entities = extractor.extract("remind me to stretch", &Intent::Greet);
    assert_eq!(entities.reminder_text, None);
}
