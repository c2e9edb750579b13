//! Tests for the language module
//!
//! Covers multiple inheritance over classifiers, feature lookup by meta-pointer and the rules
//! enforced while languages are assembled.

use nodeweave_structures::language::*;
use nodeweave_structures::model::PropertyValue;
use nodeweave_structures::{ErrorCategory, ModelError};
use std::sync::Arc;

fn shapes() -> LanguageRef {
    LanguageRef::new("shapes", "1")
}

/// Named <- Shape, Colored <- Shape, Shape <- Circle, with Named also extended by Colored to form
/// a diamond.
fn diamond() -> (Arc<Classifier>, Arc<Classifier>, Arc<Classifier>, Arc<Classifier>) {
    let language = shapes();
    let named = Classifier::interface("shapes-Named", "Named", "Named", &language)
        .feature(Feature::property("shapes-Named-name", "name", "name", &builtins::string()))
        .build();
    let colored = Classifier::interface("shapes-Colored", "Colored", "Colored", &language)
        .extends(&named)
        .unwrap()
        .feature(Feature::property("shapes-Colored-rgb", "rgb", "rgb", &builtins::integer()).optional())
        .build();
    let shape = Classifier::concept("shapes-Shape", "Shape", "Shape", &language)
        .set_abstract()
        .implements(&named)
        .unwrap()
        .implements(&colored)
        .unwrap()
        .feature(Feature::property("shapes-Shape-x", "x", "x", &builtins::integer()))
        .build();
    let circle = Classifier::concept("shapes-Circle", "Circle", "Circle", &language)
        .extends(&shape)
        .unwrap()
        .feature(Feature::property("shapes-Circle-r", "r", "r", &builtins::integer()))
        .build();
    (named, colored, shape, circle)
}

#[cfg(test)]
mod test_classifiers {
    use super::*;

    #[test]
    fn test_all_features_order_keeps_duplicates() {
        let (_, _, _, circle) = diamond();
        let keys: Vec<&str> = circle.all_features().iter().map(|f| f.key()).collect();
        // own, then Shape (own, Named, Colored (own, Named))
        assert_eq!(keys, vec!["r", "x", "name", "rgb", "name"]);
    }

    #[test]
    fn test_all_ancestors_are_unique() {
        let (named, colored, shape, circle) = diamond();
        let ancestors: Vec<MetaPointer> = circle.all_ancestors().iter().map(|c| c.meta_pointer()).collect();
        assert_eq!(
            ancestors,
            vec![shape.meta_pointer(), named.meta_pointer(), colored.meta_pointer()]
        );
        assert!(circle.is_subtype_of(&named.meta_pointer()));
        assert!(!named.is_subtype_of(&circle.meta_pointer()));
    }

    #[test]
    fn test_feature_lookup_by_meta_pointer() {
        let (_, _, _, circle) = diamond();
        let rgb = circle
            .get_feature_by_meta_pointer(&MetaPointer::new("shapes", "1", "rgb"))
            .unwrap();
        assert_eq!(rgb.id(), "shapes-Colored-rgb");
        assert!(rgb.is_optional());
        assert_eq!(rgb.declaring_language(), &shapes());

        let err = circle
            .require_feature(&MetaPointer::new("shapes", "2", "rgb"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_inheritance_kinds_are_checked() {
        let language = shapes();
        let interface = Classifier::interface("i", "I", "I", &language).build();
        let concept = Classifier::concept("c", "C", "C", &language).build();

        assert!(Classifier::concept("d", "D", "D", &language).extends(&interface).is_err());
        assert!(Classifier::concept("d", "D", "D", &language).implements(&concept).is_err());
        assert!(Classifier::interface("j", "J", "J", &language).extends(&concept).is_err());
        assert!(Classifier::interface("j", "J", "J", &language).implements(&interface).is_err());
        assert!(matches!(
            Classifier::annotation("a", "A", "A", &language).extends(&concept),
            Err(ModelError::InvalidLanguage(_))
        ));
    }
}

#[cfg(test)]
mod test_languages {
    use super::*;

    #[test]
    fn test_language_rejects_foreign_elements() {
        let mut language = Language::new("shapes-id", "shapes", "Shapes", "1");
        let foreign = Classifier::concept("x", "X", "X", &LanguageRef::new("other", "1")).build();
        assert!(language.add_classifier(&foreign).is_err());

        let (_, _, shape, _) = diamond();
        language.add_classifier(&shape).unwrap();
        assert_eq!(language.get_classifier_by_key("Shape").unwrap().id(), "shapes-Shape");
        assert!(language.get_classifier_by_name("Circle").is_none());
    }

    #[test]
    fn test_enumeration_accepts_only_its_literals() {
        let color = DataType::enumeration("shapes-Color", "Color", "Color", &shapes())
            .with_literal(EnumerationLiteral::new("shapes-Color-red", "red", "Red"))
            .with_literal(EnumerationLiteral::new("shapes-Color-blue", "blue", "Blue"));

        assert!(color.accepts(&PropertyValue::EnumerationLiteral("red".into())));
        assert!(!color.accepts(&PropertyValue::EnumerationLiteral("green".into())));
        assert!(!color.accepts(&PropertyValue::String("red".into())));
    }

    #[test]
    fn test_builtins() {
        let language = builtins::language();
        assert_eq!(language.key(), builtins::LANGUAGE_KEY);
        assert_eq!(language.version(), "2023.1");
        assert!(builtins::json().accepts(&PropertyValue::Json(serde_json::json!({"a": 1}))));
        assert!(!builtins::boolean().accepts(&PropertyValue::Integer(1)));
        assert!(validate_language(&language, &[]).issues().is_empty());
    }
}
