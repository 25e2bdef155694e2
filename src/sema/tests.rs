// src/sema/tests.rs

use super::analyzer::{Analyzer, SemaError};
use crate::errors::SemanticError;
use crate::frontend::{AstBuilder, ClassParts, FunctionParts, Modifiers, NodeId};
use crate::module::ProvidedModules;
use pretty_assertions::{assert_eq, assert_ne};

/// Build a tree, then run `check` against a fresh analyzer over it. The
/// build step returns the module plus whatever node ids the check needs.
fn with_analyzer<S, T>(
    build: impl FnOnce(&mut AstBuilder, &mut ProvidedModules) -> (NodeId, S),
    check: impl FnOnce(&mut Analyzer, NodeId, S) -> T,
) -> T {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut b = AstBuilder::new();
    let mut provided = ProvidedModules::new();
    let (module, state) = build(&mut b, &mut provided);
    let (mut ast, mut interner) = b.into_parts();
    let mut analyzer = Analyzer::new(&mut ast, &mut interner, &mut provided);
    check(&mut analyzer, module, state)
}

/// Analyze a module and return the collected errors (empty on success).
fn analyze_errors(
    build: impl FnOnce(&mut AstBuilder, &mut ProvidedModules) -> NodeId,
) -> Vec<SemaError> {
    with_analyzer(
        |b, p| (build(b, p), ()),
        |analyzer, module, ()| analyzer.analyze_module(module).err().unwrap_or_default(),
    )
}

// --- determinism ---

#[test]
fn resolving_twice_yields_identical_candidates() {
    with_analyzer(
        |b, _| {
            let greet = b.function("Greet", FunctionParts::default());
            let reference = b.ident("Greet");
            let body = b.body(vec![reference]);
            let test = b.function(
                "Test",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![greet, test],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, (reference, greet))
        },
        |analyzer, _, (reference, greet)| {
            let name = analyzer.interner.intern("Greet");
            let first = analyzer.resolve_name(reference, name).unwrap();
            let second = analyzer.resolve_name(reference, name).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.len(), 1);
            assert_eq!(first[0].decl, greet);
        },
    );
}

// --- scope shadowing ---

#[test]
fn catch_parameter_shadows_loop_variable() {
    with_analyzer(
        |b, _| {
            let reference = b.ident("x");
            let catch_body = b.body(vec![reference]);
            let catch_param = b.param("x", None, None);
            let catch_params = b.params(vec![catch_param]);
            let catch = b.catch(Some(catch_params), catch_body);
            let try_body = b.body(vec![]);
            let try_ = b.try_(try_body, vec![catch]);
            let loop_init = b.int(0);
            let loop_var = b.var("x", None, Some(loop_init));
            let for_body = b.body(vec![try_]);
            let for_ = b.for_(None, Some(loop_var), None, None, for_body);
            let fn_body = b.body(vec![for_]);
            let func = b.function(
                "Run",
                FunctionParts {
                    body: Some(fn_body),
                    ..Default::default()
                },
            );
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![func],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, (reference, catch_param, loop_var))
        },
        |analyzer, _, (reference, catch_param, loop_var)| {
            let name = analyzer.interner.intern("x");
            let candidates = analyzer.resolve_name(reference, name).unwrap();
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].decl, catch_param);
            assert_ne!(candidates[0].decl, loop_var);
        },
    );
}

// --- forward visibility ---

#[test]
fn class_member_may_reference_later_sibling() {
    with_analyzer(
        |b, _| {
            let reference = b.ident("Later");
            let body = b.body(vec![reference]);
            let func = b.function(
                "Early",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let later = b.property("Later", None, None);
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![func, later],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, (reference, later))
        },
        |analyzer, module, (reference, later)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let name = analyzer.interner.intern("Later");
            let candidates = analyzer.resolve_name(reference, name).unwrap();
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].decl, later);
        },
    );
}

#[test]
fn local_forward_reference_fails() {
    let errors = analyze_errors(|b, _| {
        let reference = b.ident("y");
        let init = b.int(1);
        let var = b.var("y", None, Some(init));
        // The reference precedes the declaration in the same block.
        let body = b.body(vec![reference, var]);
        let func = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![func],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        errors[0].error,
        SemanticError::ReferenceNotFound { ref name, .. } if name == "y"
    ));
}

// --- duplicate detection ---

#[test]
fn identical_function_signatures_collide() {
    with_analyzer(
        |b, _| {
            let first = b.function("F", FunctionParts::default());
            let second = b.function("F", FunctionParts::default());
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![first, second],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, first)
        },
        |analyzer, module, first| {
            let errors = analyzer.analyze_module(module).unwrap_err();
            let first_span = analyzer.ast.span(first);
            assert!(matches!(
                &errors[0].error,
                SemanticError::DuplicateDeclaration { name, previous, .. }
                    if name == "F" && *previous == first_span.into()
            ));
        },
    );
}

#[test]
fn differing_parameter_lists_overload() {
    let errors = analyze_errors(|b, _| {
        let first = b.function("F", FunctionParts::default());
        let param = b.param("a", None, None);
        let params = b.params(vec![param]);
        let second = b.function(
            "F",
            FunctionParts {
                params: Some(params),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![first, second],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// --- generics arity and defaults ---

#[test]
fn bare_generic_list_differs_from_absent() {
    let errors = analyze_errors(|b, _| {
        let t = b.generic("T", None, None);
        let generics = b.generics(vec![t]);
        let with = b.class(
            "C",
            ClassParts {
                generics: Some(generics),
                ..Default::default()
            },
        );
        let without = b.class("C", ClassParts::default());
        b.module("main", vec![with, without])
    });
    assert!(errors.is_empty(), "<T> should overload an absent list");
}

#[test]
fn defaulted_generic_list_equals_absent() {
    let errors = analyze_errors(|b, _| {
        let int = b.class("Int", ClassParts::default());
        let int_ref = b.ident("Int");
        let t = b.generic("T", None, Some(int_ref));
        let generics = b.generics(vec![t]);
        let with = b.class(
            "D",
            ClassParts {
                generics: Some(generics),
                ..Default::default()
            },
        );
        let without = b.class("D", ClassParts::default());
        b.module("main", vec![int, with, without])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::DuplicateDeclaration { name, .. } if name == "D"
    ));
}

#[test]
fn generics_comparator_handles_absence_and_defaults() {
    with_analyzer(
        |b, _| {
            let bare_t = b.generic("T", None, None);
            let bare = b.generics(vec![bare_t]);
            let int = b.class("Int", ClassParts::default());
            let int_ref = b.ident("Int");
            let defaulted_t = b.generic("T", None, Some(int_ref));
            let defaulted = b.generics(vec![defaulted_t]);
            let module = b.module("main", vec![int]);
            (module, (bare, defaulted))
        },
        |analyzer, _, (bare, defaulted)| {
            assert!(!analyzer.generics_equal_generics(Some(bare), None).unwrap());
            assert!(analyzer
                .generics_equal_generics(Some(defaulted), None)
                .unwrap());
            assert!(analyzer.generics_equal_generics(None, None).unwrap());
        },
    );
}

// --- call argument matching ---

#[test]
fn positional_after_named_is_rejected() {
    let errors = analyze_errors(|b, _| {
        let pa = b.param("a", None, None);
        let pb = b.param("b", None, None);
        let params = b.params(vec![pa, pb]);
        let callee = b.function(
            "F",
            FunctionParts {
                params: Some(params),
                ..Default::default()
            },
        );
        let one = b.int(1);
        let two = b.int(2);
        let named = b.arg(Some("a"), one);
        let positional = b.arg(None, two);
        let callee_ref = b.ident("F");
        let call = b.call(callee_ref, vec![named, positional]);
        let body = b.body(vec![call]);
        let caller = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![callee, caller],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        errors[0].error,
        SemanticError::PositionalAfterNamed { .. }
    ));
}

#[test]
fn named_after_positional_is_accepted() {
    let errors = analyze_errors(|b, _| {
        let pa = b.param("a", None, None);
        let pb = b.param("b", None, None);
        let params = b.params(vec![pa, pb]);
        let callee = b.function(
            "F",
            FunctionParts {
                params: Some(params),
                ..Default::default()
            },
        );
        let one = b.int(1);
        let two = b.int(2);
        let positional = b.arg(None, one);
        let named = b.arg(Some("b"), two);
        let callee_ref = b.ident("F");
        let call = b.call(callee_ref, vec![positional, named]);
        let body = b.body(vec![call]);
        let caller = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![callee, caller],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn unfilled_parameter_without_default_fails_call() {
    let errors = analyze_errors(|b, _| {
        let pa = b.param("a", None, None);
        let pb = b.param("b", None, None);
        let params = b.params(vec![pa, pb]);
        let callee = b.function(
            "F",
            FunctionParts {
                params: Some(params),
                ..Default::default()
            },
        );
        let one = b.int(1);
        let only = b.arg(None, one);
        let callee_ref = b.ident("F");
        let call = b.call(callee_ref, vec![only]);
        let body = b.body(vec![call]);
        let caller = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![callee, caller],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        errors[0].error,
        SemanticError::NoMatchingSignature { .. }
    ));
}

#[test]
fn defaulted_parameter_may_stay_unfilled() {
    let errors = analyze_errors(|b, _| {
        let pa = b.param("a", None, None);
        let fallback = b.int(9);
        let pb = b.param("b", None, Some(fallback));
        let params = b.params(vec![pa, pb]);
        let callee = b.function(
            "F",
            FunctionParts {
                params: Some(params),
                ..Default::default()
            },
        );
        let one = b.int(1);
        let only = b.arg(None, one);
        let callee_ref = b.ident("F");
        let call = b.call(callee_ref, vec![only]);
        let body = b.body(vec![call]);
        let caller = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![callee, caller],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// --- inheritance ---

#[test]
fn inherited_member_resolves_through_cached_heritage() {
    with_analyzer(
        |b, _| {
            let greet = b.function("Greet", FunctionParts::default());
            let base = b.class(
                "Base",
                ClassParts {
                    members: vec![greet],
                    ..Default::default()
                },
            );
            let base_ref = b.ident("Base");
            let heritage = b.heritage(None, base_ref);
            let heritages = b.heritages(vec![heritage]);
            let derived = b.class(
                "Derived",
                ClassParts {
                    heritages: Some(heritages),
                    ..Default::default()
                },
            );
            let derived_ref = b.ident("Derived");
            let attr = b.attr(derived_ref, "Greet");
            let body = b.body(vec![attr]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![base, derived, runner]);
            (module, (attr, greet, heritage, base))
        },
        |analyzer, module, (attr, greet, heritage, base)| {
            assert!(analyzer.analyze_module(module).is_ok());

            let targets = analyzer.resolutions.targets_of(attr).to_vec();
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].decl, greet);

            // The heritage resolved once; a second lookup reuses the cache.
            assert_eq!(analyzer.resolutions.heritage_target(heritage), Some(base));
            let cached = analyzer.resolutions.heritage_target_count();
            let again = analyzer.resolve_expr(attr).unwrap();
            assert_eq!(again[0].decl, greet);
            assert_eq!(analyzer.resolutions.heritage_target_count(), cached);
        },
    );
}

#[test]
fn subclass_test_crosses_intermediate_classes() {
    with_analyzer(
        |b, _| {
            let top = b.class("Top", ClassParts::default());
            let top_ref = b.ident("Top");
            let mid_h = b.heritage(None, top_ref);
            let mid_hs = b.heritages(vec![mid_h]);
            let mid = b.class(
                "Mid",
                ClassParts {
                    heritages: Some(mid_hs),
                    ..Default::default()
                },
            );
            let mid_ref = b.ident("Mid");
            let low_h = b.heritage(None, mid_ref);
            let low_hs = b.heritages(vec![low_h]);
            let low = b.class(
                "Low",
                ClassParts {
                    heritages: Some(low_hs),
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![top, mid, low]);
            (module, (top, mid, low))
        },
        |analyzer, module, (top, mid, low)| {
            assert!(analyzer.analyze_module(module).is_ok());
            assert!(analyzer.is_subclass_of(low, top).unwrap());
            assert!(analyzer.is_subclass_of(low, mid).unwrap());
            assert!(!analyzer.is_subclass_of(top, low).unwrap());
        },
    );
}

#[test]
fn heritage_cycle_is_reported() {
    let errors = analyze_errors(|b, _| {
        let b_ref = b.ident("B");
        let ha = b.heritage(None, b_ref);
        let has = b.heritages(vec![ha]);
        let class_a = b.class(
            "A",
            ClassParts {
                heritages: Some(has),
                ..Default::default()
            },
        );
        let a_ref = b.ident("A");
        let hb = b.heritage(None, a_ref);
        let hbs = b.heritages(vec![hb]);
        let class_b = b.class(
            "B",
            ClassParts {
                heritages: Some(hbs),
                ..Default::default()
            },
        );
        b.module("main", vec![class_a, class_b])
    });
    assert!(errors
        .iter()
        .any(|e| matches!(e.error, SemanticError::HeritageCycle { .. })));
}

#[test]
fn protected_member_is_hidden_from_outside_but_inherited() {
    with_analyzer(
        |b, _| {
            let hidden = b.function("Hidden", FunctionParts::default());
            b.ast
                .set_modifiers(hidden, Modifiers::PROTECT);
            let base = b.class(
                "Base",
                ClassParts {
                    members: vec![hidden],
                    ..Default::default()
                },
            );
            let base_ref = b.ident("Base");
            let heritage = b.heritage(None, base_ref);
            let heritages = b.heritages(vec![heritage]);
            let reference = b.ident("Hidden");
            let body = b.body(vec![reference]);
            let caller = b.function(
                "Call",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let derived = b.class(
                "Derived",
                ClassParts {
                    heritages: Some(heritages),
                    members: vec![caller],
                    ..Default::default()
                },
            );
            let derived_ref = b.ident("Derived");
            let outside_attr = b.attr(derived_ref, "Hidden");
            let outside_body = b.body(vec![outside_attr]);
            let outside = b.function(
                "Outside",
                FunctionParts {
                    body: Some(outside_body),
                    ..Default::default()
                },
            );
            let other = b.class(
                "Other",
                ClassParts {
                    members: vec![outside],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![base, derived, other]);
            (module, (reference, hidden, outside_attr))
        },
        |analyzer, module, (reference, hidden, outside_attr)| {
            let errors = analyzer.analyze_module(module).unwrap_err();
            // Lexical use inside the subclass sees the protected member.
            let name = analyzer.interner.intern("Hidden");
            let inside = analyzer.resolve_name(reference, name).unwrap();
            assert_eq!(inside.len(), 1);
            assert_eq!(inside[0].decl, hidden);
            // External attribute access does not.
            assert!(analyzer.resolutions.targets_of(outside_attr).is_empty());
            assert!(errors
                .iter()
                .any(|e| matches!(&e.error, SemanticError::ReferenceNotFound { name, .. }
                    if name == "Derived.Hidden")));
        },
    );
}

// --- entry point rules ---

#[test]
fn second_main_annotation_is_fatal() {
    with_analyzer(
        |b, _| {
            let a1 = b.annotation("Main");
            let anns1 = b.annotations(vec![a1]);
            let first = b.function(
                "Start",
                FunctionParts {
                    annotations: Some(anns1),
                    modifiers: Modifiers::STATIC,
                    ..Default::default()
                },
            );
            let a2 = b.annotation("Main");
            let anns2 = b.annotations(vec![a2]);
            let second = b.function(
                "Boot",
                FunctionParts {
                    annotations: Some(anns2),
                    modifiers: Modifiers::STATIC,
                    ..Default::default()
                },
            );
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![first, second],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, first)
        },
        |analyzer, module, first| {
            let errors = analyzer.analyze_module(module).unwrap_err();
            let first_span = analyzer.ast.span(first);
            assert!(matches!(
                &errors[0].error,
                SemanticError::MainAlreadyDefined { previous, .. }
                    if *previous == first_span.into()
            ));
        },
    );
}

#[test]
fn single_static_main_is_recorded() {
    with_analyzer(
        |b, _| {
            let a = b.annotation("Main");
            let anns = b.annotations(vec![a]);
            let main = b.function(
                "Start",
                FunctionParts {
                    annotations: Some(anns),
                    modifiers: Modifiers::STATIC,
                    ..Default::default()
                },
            );
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![main],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, main)
        },
        |analyzer, module, main| {
            assert!(analyzer.analyze_module(module).is_ok());
            assert_eq!(analyzer.resolutions.main_function, Some(main));
        },
    );
}

#[test]
fn non_static_main_is_rejected() {
    let errors = analyze_errors(|b, _| {
        let a = b.annotation("Main");
        let anns = b.annotations(vec![a]);
        let main = b.function(
            "Start",
            FunctionParts {
                annotations: Some(anns),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![main],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(errors[0].error, SemanticError::MainNotStatic { .. }));
}

// --- static class rules ---

#[test]
fn static_class_rejects_generics_and_non_static_members() {
    let errors = analyze_errors(|b, _| {
        let t = b.generic("T", None, None);
        let generics = b.generics(vec![t]);
        let with_generics = b.class(
            "G",
            ClassParts {
                generics: Some(generics),
                modifiers: Modifiers::STATIC,
                ..Default::default()
            },
        );
        let member = b.function("M", FunctionParts::default());
        let with_member = b.class(
            "H",
            ClassParts {
                members: vec![member],
                modifiers: Modifiers::STATIC,
                ..Default::default()
            },
        );
        b.module("main", vec![with_generics, with_member])
    });
    assert!(errors
        .iter()
        .any(|e| matches!(e.error, SemanticError::StaticClassGenerics { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(&e.error, SemanticError::StaticClassMember { name, .. } if name == "M")));
}

// --- annotations ---

#[test]
fn repeated_annotation_key_is_rejected() {
    let errors = analyze_errors(|b, _| {
        let a1 = b.annotation("Inline");
        let a2 = b.annotation("Inline");
        let anns = b.annotations(vec![a1, a2]);
        let func = b.function(
            "F",
            FunctionParts {
                annotations: Some(anns),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![func],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::DuplicateAnnotation { key, .. } if key == "Inline"
    ));
}

// --- constructors and values ---

#[test]
fn constructor_call_marks_instance_and_member_access_works() {
    with_analyzer(
        |b, _| {
            let bark = b.function("Bark", FunctionParts::default());
            let ctor = b.function("Constructor", FunctionParts::default());
            let dog = b.class(
                "Dog",
                ClassParts {
                    members: vec![ctor, bark],
                    ..Default::default()
                },
            );
            let dog_ref = b.ident("Dog");
            let construct = b.call(dog_ref, vec![]);
            let var = b.var("d", None, Some(construct));
            let d_ref = b.ident("d");
            let bark_attr = b.attr(d_ref, "Bark");
            let body = b.body(vec![var, bark_attr]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![dog, runner]);
            (module, (construct, var, bark_attr, bark, dog))
        },
        |analyzer, module, (construct, var, bark_attr, bark, dog)| {
            assert!(analyzer.analyze_module(module).is_ok());
            assert!(analyzer.resolutions.instances.contains(&construct));
            let value = analyzer.resolutions.value_types[&var];
            assert_eq!(value.decl, dog);
            let targets = analyzer.resolutions.targets_of(bark_attr);
            assert_eq!(targets[0].decl, bark);
        },
    );
}

#[test]
fn class_without_constructor_cannot_be_called() {
    let errors = analyze_errors(|b, _| {
        let cat = b.class("Cat", ClassParts::default());
        let cat_ref = b.ident("Cat");
        let call = b.call(cat_ref, vec![]);
        let body = b.body(vec![call]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let runner = b.class(
            "Runner",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![cat, runner])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::MissingConstructor { name, .. } if name == "Cat"
    ));
}

#[test]
fn calling_a_property_value_is_not_callable() {
    let errors = analyze_errors(|b, _| {
        let zero = b.int(0);
        let prop = b.property("p", None, Some(zero));
        let p_ref = b.ident("p");
        let call = b.call(p_ref, vec![]);
        let body = b.body(vec![call]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![prop, run],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::NotCallable { name, .. } if name == "p"
    ));
}

// --- indexing ---

#[test]
fn index_operator_member_resolves() {
    with_analyzer(
        |b, _| {
            let ctor = b.function("Constructor", FunctionParts::default());
            let i = b.param("i", None, None);
            let params = b.params(vec![i]);
            let op = b.function(
                "[]",
                FunctionParts {
                    params: Some(params),
                    ..Default::default()
                },
            );
            let list = b.class(
                "List",
                ClassParts {
                    members: vec![ctor, op],
                    ..Default::default()
                },
            );
            let list_ref = b.ident("List");
            let construct = b.call(list_ref, vec![]);
            let var = b.var("xs", None, Some(construct));
            let xs_ref = b.ident("xs");
            let zero = b.int(0);
            let arg = b.arg(None, zero);
            let index = b.index(xs_ref, vec![arg]);
            let body = b.body(vec![var, index]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![list, runner]);
            (module, (index, op))
        },
        |analyzer, module, (index, op)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let targets = analyzer.resolutions.targets_of(index);
            assert_eq!(targets[0].decl, op);
        },
    );
}

// --- generic instantiation ---

#[test]
fn pseudonym_selects_matching_generic_shape() {
    with_analyzer(
        |b, _| {
            let int = b.class("Int", ClassParts::default());
            let t = b.generic("T", None, None);
            let generics = b.generics(vec![t]);
            let boxed = b.class(
                "Box",
                ClassParts {
                    generics: Some(generics),
                    ..Default::default()
                },
            );
            let box_ref = b.ident("Box");
            let int_ref = b.ident("Int");
            let field = b.field(None, int_ref);
            let pseudonym = b.pseudonym(box_ref, vec![field]);
            let var = b.var("x", Some(pseudonym), None);
            let body = b.body(vec![var]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![int, boxed, runner]);
            (module, (pseudonym, boxed))
        },
        |analyzer, module, (pseudonym, boxed)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let targets = analyzer.resolutions.targets_of(pseudonym);
            assert_eq!(targets[0].decl, boxed);
        },
    );
}

#[test]
fn pseudonym_with_surplus_fields_is_rejected() {
    let errors = analyze_errors(|b, _| {
        let int = b.class("Int", ClassParts::default());
        let t = b.generic("T", None, None);
        let generics = b.generics(vec![t]);
        let boxed = b.class(
            "Box",
            ClassParts {
                generics: Some(generics),
                ..Default::default()
            },
        );
        let box_ref = b.ident("Box");
        let int_ref1 = b.ident("Int");
        let int_ref2 = b.ident("Int");
        let f1 = b.field(None, int_ref1);
        let f2 = b.field(None, int_ref2);
        let pseudonym = b.pseudonym(box_ref, vec![f1, f2]);
        let var = b.var("x", Some(pseudonym), None);
        let body = b.body(vec![var]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let runner = b.class(
            "Runner",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![int, boxed, runner])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::GenericMismatch { name, .. } if name == "Box"
    ));
}

#[test]
fn pseudonym_bound_requires_subclass() {
    let errors = analyze_errors(|b, _| {
        let animal = b.class("Animal", ClassParts::default());
        let stone = b.class("Stone", ClassParts::default());
        let animal_ref = b.ident("Animal");
        let t = b.generic("T", Some(animal_ref), None);
        let generics = b.generics(vec![t]);
        let pen = b.class(
            "Pen",
            ClassParts {
                generics: Some(generics),
                ..Default::default()
            },
        );
        let pen_ref = b.ident("Pen");
        let stone_ref = b.ident("Stone");
        let field = b.field(None, stone_ref);
        let pseudonym = b.pseudonym(pen_ref, vec![field]);
        let var = b.var("x", Some(pseudonym), None);
        let body = b.body(vec![var]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let runner = b.class(
            "Runner",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![animal, stone, pen, runner])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::GenericMismatch { name, .. } if name == "Pen"
    ));
}

// --- enums ---

#[test]
fn enum_member_access_resolves_and_misses_do_not_fall_through() {
    with_analyzer(
        |b, _| {
            let color = b.enum_("Color", &["Red", "Green"]);
            // An outer class named Blue must not satisfy Color.Blue.
            let blue = b.class("Blue", ClassParts::default());
            let c1 = b.ident("Color");
            let hit = b.attr(c1, "Red");
            let c2 = b.ident("Color");
            let miss = b.attr(c2, "Blue");
            let body = b.body(vec![hit, miss]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![color, blue, runner]);
            (module, (hit, miss))
        },
        |analyzer, module, (hit, miss)| {
            let errors = analyzer.analyze_module(module).unwrap_err();
            assert_eq!(analyzer.resolutions.targets_of(hit).len(), 1);
            assert!(analyzer.resolutions.targets_of(miss).is_empty());
            assert!(matches!(
                &errors[0].error,
                SemanticError::ReferenceNotFound { name, .. } if name == "Color.Blue"
            ));
        },
    );
}

// --- modules and imports ---

#[test]
fn missing_import_is_reported() {
    let errors = analyze_errors(|b, _| {
        let using = b.using("absent");
        b.module("main", vec![using])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::ModuleLoad { path, .. } if path == "absent"
    ));
}

#[test]
fn imported_class_collides_with_local_duplicate() {
    let errors = analyze_errors(|b, provided| {
        let foreign = b.class("Animal", ClassParts::default());
        b.ast.set_modifiers(foreign, Modifiers::EXPORT);
        let base = b.module("base", vec![foreign]);
        provided.insert("base", base);

        let using = b.using("base");
        let local = b.class("Animal", ClassParts::default());
        b.module("main", vec![using, local])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::DuplicateDeclaration { name, .. } if name == "Animal"
    ));
}

#[test]
fn end_to_end_import_with_inherited_member() {
    with_analyzer(
        |b, provided| {
            let speak = b.function("Speak", FunctionParts::default());
            let animal = b.class(
                "Animal",
                ClassParts {
                    members: vec![speak],
                    ..Default::default()
                },
            );
            b.ast.set_modifiers(animal, Modifiers::EXPORT);
            let base_module = b.module("base", vec![animal]);
            provided.insert("base", base_module);

            let using = b.using("base");
            let animal_ref = b.ident("Animal");
            let heritage = b.heritage(None, animal_ref);
            let heritages = b.heritages(vec![heritage]);
            let dog = b.class(
                "Dog",
                ClassParts {
                    heritages: Some(heritages),
                    ..Default::default()
                },
            );
            let dog_ref = b.ident("Dog");
            let attr = b.attr(dog_ref, "Speak");
            let body = b.body(vec![attr]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![using, dog, runner]);
            (module, (attr, speak, heritage, animal))
        },
        |analyzer, module, (attr, speak, heritage, animal)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let targets = analyzer.resolutions.targets_of(attr);
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].decl, speak);
            assert_eq!(analyzer.resolutions.heritage_target(heritage), Some(animal));
        },
    );
}

#[test]
fn package_alias_projects_into_exports() {
    with_analyzer(
        |b, provided| {
            let tool = b.class("Tool", ClassParts::default());
            b.ast.set_modifiers(tool, Modifiers::EXPORT);
            let lib = b.module("lib", vec![tool]);
            provided.insert("lib", lib);

            let using = b.using_as("lib", "kit", None);
            let kit_ref = b.ident("kit");
            let attr = b.attr(kit_ref, "Tool");
            let body = b.body(vec![attr]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let runner = b.class(
                "Runner",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![using, runner]);
            (module, (attr, tool))
        },
        |analyzer, module, (attr, tool)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let targets = analyzer.resolutions.targets_of(attr);
            assert_eq!(targets[0].decl, tool);
        },
    );
}

#[test]
fn non_exported_symbol_is_invisible_to_importers() {
    let errors = analyze_errors(|b, provided| {
        let private = b.class("Secret", ClassParts::default());
        let base = b.module("base", vec![private]);
        provided.insert("base", base);

        let using = b.using("base");
        let secret_ref = b.ident("Secret");
        let var = b.var("s", Some(secret_ref), None);
        let body = b.body(vec![var]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let runner = b.class(
            "Runner",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![using, runner])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::ReferenceNotFound { name, .. } if name == "Secret"
    ));
}

// --- finalize ---

#[test]
fn finalize_locates_system_constructor() {
    with_analyzer(
        |b, _| {
            let ctor = b.function("Constructor", FunctionParts::default());
            let system = b.class(
                "System",
                ClassParts {
                    members: vec![ctor],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![system]);
            (module, (system, ctor))
        },
        |analyzer, module, (system, ctor)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let entry = analyzer.finalize(module).unwrap();
            assert_eq!(entry.class, system);
            assert_eq!(entry.constructor, ctor);
        },
    );
}

#[test]
fn finalize_without_entry_class_fails() {
    with_analyzer(
        |b, _| {
            let class = b.class("C", ClassParts::default());
            (b.module("main", vec![class]), ())
        },
        |analyzer, module, ()| {
            let _ = analyzer.analyze_module(module);
            assert!(analyzer.finalize(module).is_err());
            assert!(matches!(
                analyzer.errors()[0].error,
                SemanticError::EntryClassMissing { .. }
            ));
        },
    );
}

#[test]
fn finalize_without_constructor_fails() {
    with_analyzer(
        |b, _| {
            let system = b.class("System", ClassParts::default());
            (b.module("main", vec![system]), ())
        },
        |analyzer, module, ()| {
            let _ = analyzer.analyze_module(module);
            assert!(analyzer.finalize(module).is_err());
            assert!(matches!(
                analyzer.errors()[0].error,
                SemanticError::EntryConstructorMissing { .. }
            ));
        },
    );
}

// --- batching across top-level items ---

#[test]
fn errors_are_collected_across_top_level_items() {
    let errors = analyze_errors(|b, _| {
        // Two independent failures in two separate classes.
        let bad_ref1 = b.ident("Missing1");
        let body1 = b.body(vec![bad_ref1]);
        let f1 = b.function(
            "F",
            FunctionParts {
                body: Some(body1),
                ..Default::default()
            },
        );
        let c1 = b.class(
            "C1",
            ClassParts {
                members: vec![f1],
                ..Default::default()
            },
        );
        let bad_ref2 = b.ident("Missing2");
        let body2 = b.body(vec![bad_ref2]);
        let f2 = b.function(
            "G",
            FunctionParts {
                body: Some(body2),
                ..Default::default()
            },
        );
        let c2 = b.class(
            "C2",
            ClassParts {
                members: vec![f2],
                ..Default::default()
            },
        );
        b.module("main", vec![c1, c2])
    });
    assert_eq!(errors.len(), 2);
}

// --- destructuring and labels ---

#[test]
fn destructured_entity_collides_with_later_var() {
    let errors = analyze_errors(|b, _| {
        let init = b.null();
        let entities = b.var_entities(&["a", "b"], Some(init));
        let one = b.int(1);
        let clash = b.var("b", None, Some(one));
        let body = b.body(vec![entities, clash]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::DuplicateDeclaration { name, .. } if name == "b"
    ));
}

#[test]
fn destructured_entities_resolve() {
    with_analyzer(
        |b, _| {
            let init = b.null();
            let var = b.var_entities(&["a", "b"], Some(init));
            let a_ref = b.ident("a");
            let body = b.body(vec![var, a_ref]);
            let run = b.function(
                "Run",
                FunctionParts {
                    body: Some(body),
                    ..Default::default()
                },
            );
            let class = b.class(
                "C",
                ClassParts {
                    members: vec![run],
                    ..Default::default()
                },
            );
            let module = b.module("main", vec![class]);
            (module, (a_ref, var))
        },
        |analyzer, module, (a_ref, _var)| {
            assert!(analyzer.analyze_module(module).is_ok());
            let name = analyzer.interner.intern("a");
            let candidates = analyzer.resolve_name(a_ref, name).unwrap();
            assert_eq!(candidates.len(), 1);
        },
    );
}

#[test]
fn duplicate_var_in_block_is_rejected() {
    let errors = analyze_errors(|b, _| {
        let one = b.int(1);
        let first = b.var("x", None, Some(one));
        let two = b.int(2);
        let second = b.var("x", None, Some(two));
        let body = b.body(vec![first, second]);
        let run = b.function(
            "Run",
            FunctionParts {
                body: Some(body),
                ..Default::default()
            },
        );
        let class = b.class(
            "C",
            ClassParts {
                members: vec![run],
                ..Default::default()
            },
        );
        b.module("main", vec![class])
    });
    assert!(matches!(
        &errors[0].error,
        SemanticError::DuplicateDeclaration { name, .. } if name == "x"
    ));
}
