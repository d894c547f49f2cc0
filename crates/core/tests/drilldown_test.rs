use modeleval_core::query::{DetectionsPaths, Expr, FilterPredicate, LabelPaths, ViewStage};
use modeleval_core::{
    ClassLabel, DrillDownCompiler, EvaluationConfig, EvaluationInfo, Selection,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn eval(key: &str, eval_type: &str, method: Option<&str>, gt: &str, pred: &str) -> EvaluationInfo {
    EvaluationInfo::new(key, Some("id"), EvaluationConfig::new(eval_type, method, gt, pred))
}

fn compile(
    primary: &EvaluationInfo,
    comparison: Option<&EvaluationInfo>,
    selection: Selection,
) -> Option<FilterPredicate> {
    DrillDownCompiler::new(&DetectionsPaths).compile(primary, comparison, &selection)
}

fn class(x: &str) -> Selection {
    Selection::Class {
        x: ClassLabel::class(x),
    }
}

fn cell(x: Option<&str>, y: Option<&str>) -> Selection {
    let label = |v: Option<&str>| v.map_or(ClassLabel::Missing, ClassLabel::class);
    Selection::Matrix {
        x: label(x),
        y: label(y),
    }
}

fn field(name: &str) -> Selection {
    Selection::Field {
        field: name.to_string(),
    }
}

fn eq(path: &str, value: serde_json::Value) -> Expr {
    Expr::Eq {
        path: path.to_string(),
        value,
    }
}

fn non_empty(path: &str) -> Expr {
    Expr::NonEmpty {
        path: path.to_string(),
    }
}

fn filter_labels(field: &str, filter: Expr, only_matches: bool) -> ViewStage {
    ViewStage::FilterLabels {
        field: field.to_string(),
        filter,
        only_matches,
    }
}

fn matching(filter: Expr) -> ViewStage {
    ViewStage::Match { filter }
}

fn stages(predicate: Option<FilterPredicate>) -> Vec<ViewStage> {
    predicate.expect("selection compiles to a predicate").stages
}

// classification

#[test]
fn test_classification_class_matches_either_side() {
    let primary = eval("simple", "classification", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, class("cat"))),
        vec![matching(Expr::Or(vec![
            eq("ground_truth.label", json!("cat")),
            eq("predictions.label", json!("cat")),
        ]))]
    );
}

#[test]
fn test_classification_class_with_comparison_sharing_ground_truth() {
    let primary = eval("simple", "classification", None, "ground_truth", "predictions");
    let other = eval("other", "classification", None, "ground_truth", "resnet");
    assert_eq!(
        stages(compile(&primary, Some(&other), class("cat"))),
        vec![matching(Expr::Or(vec![
            eq("ground_truth.label", json!("cat")),
            eq("predictions.label", json!("cat")),
            eq("resnet.label", json!("cat")),
        ]))]
    );
}

#[test]
fn test_classification_class_with_comparison_on_other_ground_truth() {
    let primary = eval("simple", "classification", None, "ground_truth", "predictions");
    let other = eval("other", "classification", None, "relabeled", "resnet");
    assert_eq!(
        stages(compile(&primary, Some(&other), class("cat"))),
        vec![matching(Expr::Or(vec![
            eq("ground_truth.label", json!("cat")),
            eq("predictions.label", json!("cat")),
            eq("relabeled.label", json!("cat")),
            eq("resnet.label", json!("cat")),
        ]))]
    );
}

#[test]
fn test_classification_matrix_cell() {
    let primary = eval("simple", "classification", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, cell(Some("dog"), Some("cat")))),
        vec![matching(Expr::And(vec![
            eq("ground_truth.label", json!("cat")),
            eq("predictions.label", json!("dog")),
        ]))]
    );
}

#[test]
fn test_classification_matrix_ignores_comparison() {
    let primary = eval("simple", "classification", None, "ground_truth", "predictions");
    let other = eval("other", "classification", None, "relabeled", "resnet");
    assert_eq!(
        compile(&primary, Some(&other), cell(Some("dog"), Some("cat"))),
        compile(&primary, None, cell(Some("dog"), Some("cat")))
    );
}

#[test]
fn test_binary_classification_field_is_uppercased() {
    let primary = eval("bin", "classification", Some("binary"), "gt", "pred");
    assert_eq!(
        stages(compile(&primary, None, field("fp"))),
        vec![matching(eq("bin", json!("FP")))]
    );
}

#[test]
fn test_simple_classification_field_is_verbatim() {
    for method in [None, Some("simple"), Some("top-k")] {
        let primary = eval("simple", "classification", method, "gt", "pred");
        assert_eq!(
            stages(compile(&primary, None, field("correct"))),
            vec![matching(eq("simple", json!("correct")))],
            "{method:?}"
        );
    }
}

// detection

#[test]
fn test_detection_class_requires_a_matching_label() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, class("cat"))),
        vec![
            filter_labels("ground_truth", eq("label", json!("cat")), false),
            filter_labels("predictions", eq("label", json!("cat")), false),
            matching(Expr::Or(vec![
                non_empty("ground_truth.detections"),
                non_empty("predictions.detections"),
            ])),
        ]
    );
}

#[test]
fn test_detection_class_with_comparison() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    let same_gt = eval("det2", "detection", None, "ground_truth", "yolo");
    assert_eq!(
        stages(compile(&primary, Some(&same_gt), class("cat"))),
        vec![
            filter_labels("ground_truth", eq("label", json!("cat")), false),
            filter_labels("predictions", eq("label", json!("cat")), false),
            filter_labels("yolo", eq("label", json!("cat")), false),
            matching(Expr::Or(vec![
                non_empty("ground_truth.detections"),
                non_empty("predictions.detections"),
                non_empty("yolo.detections"),
            ])),
        ]
    );

    let other_gt = eval("det3", "detection", None, "relabeled", "yolo");
    let compiled = stages(compile(&primary, Some(&other_gt), class("cat")));
    assert_eq!(compiled.len(), 5);
    assert_eq!(
        compiled[2],
        filter_labels("relabeled", eq("label", json!("cat")), false)
    );
}

#[test]
fn test_detection_false_positive_cell() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, cell(Some("dog"), None))),
        vec![filter_labels(
            "predictions",
            Expr::And(vec![eq("label", json!("dog")), eq("det", json!("fp"))]),
            true
        )]
    );
}

#[test]
fn test_detection_false_negative_cell() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, cell(None, Some("cat")))),
        vec![filter_labels(
            "ground_truth",
            Expr::And(vec![eq("label", json!("cat")), eq("det", json!("fn"))]),
            true
        )]
    );
}

#[test]
fn test_detection_confusion_cell() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, cell(Some("dog"), Some("cat")))),
        vec![
            filter_labels("ground_truth", eq("label", json!("cat")), false),
            filter_labels("predictions", eq("label", json!("dog")), false),
            matching(Expr::And(vec![
                non_empty("ground_truth.detections"),
                non_empty("predictions.detections"),
            ])),
        ]
    );
}

#[test]
fn test_detection_tp_field_filters_both_sides() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, field("tp"))),
        vec![
            filter_labels("ground_truth", eq("det", json!("tp")), false),
            filter_labels("predictions", eq("det", json!("tp")), true),
        ]
    );
}

#[test]
fn test_detection_fn_field_filters_ground_truth() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, field("fn"))),
        vec![filter_labels("ground_truth", eq("det", json!("fn")), true)]
    );
}

#[test]
fn test_detection_other_fields_filter_predictions() {
    let primary = eval("det", "detection", None, "ground_truth", "predictions");
    assert_eq!(
        stages(compile(&primary, None, field("fp"))),
        vec![filter_labels("predictions", eq("det", json!("fp")), true)]
    );
}

#[test]
fn test_label_paths_are_resolved_through_the_collaborator() {
    struct PolylinePaths;
    impl LabelPaths for PolylinePaths {
        fn label_list_path(&self, field: &str) -> String {
            format!("{field}.polylines")
        }
    }

    let primary = eval("det", "detection", None, "gt", "pred");
    let predicate = DrillDownCompiler::new(&PolylinePaths)
        .compile(&primary, None, &cell(Some("dog"), Some("cat")))
        .unwrap();
    assert_eq!(
        predicate.stages.last(),
        Some(&matching(Expr::And(vec![
            non_empty("gt.polylines"),
            non_empty("pred.polylines"),
        ])))
    );
}

#[test]
fn test_segmentation_and_unknown_types_have_no_predicate() {
    for eval_type in ["segmentation", "regression"] {
        let primary = eval("seg", eval_type, None, "gt", "pred");
        assert_eq!(compile(&primary, None, class("road")), None, "{eval_type}");
        assert_eq!(compile(&primary, None, field("tp")), None, "{eval_type}");
    }
}
