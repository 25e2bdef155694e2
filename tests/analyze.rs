// tests/analyze.rs
//! End-to-end analysis through the public API: build modules, analyze,
//! inspect the output tables, locate the entry point, render diagnostics.

use marten::errors::{render_to_string, SemanticError};
use marten::frontend::{AstBuilder, ClassParts, FunctionParts, Modifiers};
use marten::module::ProvidedModules;
use marten::sema::Analyzer;

#[test]
fn analyzes_imported_inheritance_and_locates_entry_point() {
    let mut b = AstBuilder::new();
    let mut provided = ProvidedModules::new();

    // Library module: an exported base class with a member function.
    let speak = b.function("Speak", FunctionParts::default());
    let animal = b.class(
        "Animal",
        ClassParts {
            members: vec![speak],
            ..Default::default()
        },
    );
    b.ast.set_modifiers(animal, Modifiers::EXPORT);
    let base = b.module("base", vec![animal]);
    provided.insert("base", base);

    // Main module: a derived class with a constructor, and the entry class
    // whose constructor builds one and calls the inherited member.
    let using = b.using("base");
    let animal_ref = b.ident("Animal");
    let heritage = b.heritage(None, animal_ref);
    let heritages = b.heritages(vec![heritage]);
    let dog_ctor = b.function("Constructor", FunctionParts::default());
    let dog = b.class(
        "Dog",
        ClassParts {
            heritages: Some(heritages),
            members: vec![dog_ctor],
            ..Default::default()
        },
    );

    let dog_ref = b.ident("Dog");
    let construct = b.call(dog_ref, vec![]);
    let pup = b.var("pup", None, Some(construct));
    let pup_ref = b.ident("pup");
    let speak_attr = b.attr(pup_ref, "Speak");
    let body = b.body(vec![pup, speak_attr]);
    let system_ctor = b.function(
        "Constructor",
        FunctionParts {
            body: Some(body),
            ..Default::default()
        },
    );
    let system = b.class(
        "System",
        ClassParts {
            members: vec![system_ctor],
            ..Default::default()
        },
    );
    let module = b.module("main", vec![using, dog, system]);

    let (mut ast, mut interner) = b.into_parts();
    let mut analyzer = Analyzer::new(&mut ast, &mut interner, &mut provided);
    analyzer.analyze_module(module).expect("analysis succeeds");

    let entry = analyzer.finalize(module).expect("entry point exists");
    assert_eq!(entry.class, system);
    assert_eq!(entry.constructor, system_ctor);

    let (resolutions, errors) = analyzer.into_output();
    assert!(errors.is_empty());
    // The constructor call produced an instance, the variable took Dog as
    // its type, and the inherited member resolved through the heritage.
    assert!(resolutions.instances.contains(&construct));
    assert_eq!(resolutions.value_types[&pup].decl, dog);
    assert_eq!(resolutions.targets_of(speak_attr)[0].decl, speak);
}

#[test]
fn duplicate_diagnostics_render_with_code_and_both_sites() {
    let mut b = AstBuilder::new();
    let mut provided = ProvidedModules::new();
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

    let (mut ast, mut interner) = b.into_parts();
    let mut analyzer = Analyzer::new(&mut ast, &mut interner, &mut provided);
    let errors = analyzer.analyze_module(module).unwrap_err();

    assert!(matches!(
        errors[0].error,
        SemanticError::DuplicateDeclaration { .. }
    ));
    let rendered = render_to_string(&errors[0].error);
    assert!(rendered.contains("E2002"));
    assert!(rendered.contains("already declared"));
}
