// src/errors/sema.rs
//! Semantic analysis errors (E2xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SemanticError {
    #[error("reference '{name}' not found")]
    #[diagnostic(code(E2001))]
    ReferenceNotFound {
        name: String,
        #[label("not found in scope")]
        span: SourceSpan,
    },

    #[error("'{name}' is already declared")]
    #[diagnostic(code(E2002))]
    DuplicateDeclaration {
        name: String,
        #[label("duplicate declaration")]
        span: SourceSpan,
        #[label("previously declared here")]
        previous: SourceSpan,
    },

    #[error("'Main' is already defined")]
    #[diagnostic(code(E2003))]
    MainAlreadyDefined {
        #[label("second entry point")]
        span: SourceSpan,
        #[label("first defined here")]
        previous: SourceSpan,
    },

    #[error("'Main' function must be static")]
    #[diagnostic(code(E2004))]
    MainNotStatic {
        #[label("declared here")]
        span: SourceSpan,
    },

    #[error("member '{name}' of a static class must be static")]
    #[diagnostic(
        code(E2005),
        help("add the static modifier or make the class non-static")
    )]
    StaticClassMember {
        name: String,
        #[label("non-static member")]
        span: SourceSpan,
    },

    #[error("a static class cannot declare generics")]
    #[diagnostic(code(E2006))]
    StaticClassGenerics {
        #[label("generics on a static class")]
        span: SourceSpan,
    },

    #[error("a static class cannot inherit")]
    #[diagnostic(code(E2007))]
    StaticClassHeritage {
        #[label("inheritance clause on a static class")]
        span: SourceSpan,
    },

    #[error("annotation '{key}' is repeated")]
    #[diagnostic(code(E2008))]
    DuplicateAnnotation {
        key: String,
        #[label("repeated annotation")]
        span: SourceSpan,
        #[label("first used here")]
        previous: SourceSpan,
    },

    #[error("positional argument after named argument")]
    #[diagnostic(
        code(E2009),
        help("once an argument is named, all following arguments must be named")
    )]
    PositionalAfterNamed {
        #[label("positional argument here")]
        span: SourceSpan,
    },

    #[error("no signature of '{name}' matches this call")]
    #[diagnostic(code(E2010))]
    NoMatchingSignature {
        name: String,
        #[label("arguments do not match any declaration")]
        span: SourceSpan,
    },

    #[error("'{name}' is not callable")]
    #[diagnostic(code(E2011))]
    NotCallable {
        name: String,
        #[label("not a function or constructible class")]
        span: SourceSpan,
    },

    #[error("'{name}' cannot be indexed")]
    #[diagnostic(code(E2012), help("indexing requires a class with a '[]' member"))]
    NotIndexable {
        name: String,
        #[label("no matching '[]' member")]
        span: SourceSpan,
    },

    #[error("class '{name}' has no constructor matching this call")]
    #[diagnostic(code(E2013))]
    MissingConstructor {
        name: String,
        #[label("constructed here")]
        span: SourceSpan,
    },

    #[error("field '{key}' is repeated")]
    #[diagnostic(code(E2014))]
    DuplicateFieldKey {
        key: String,
        #[label("repeated field")]
        span: SourceSpan,
        #[label("first given here")]
        previous: SourceSpan,
    },

    #[error("no generic signature of '{name}' matches these arguments")]
    #[diagnostic(code(E2015))]
    GenericMismatch {
        name: String,
        #[label("type arguments do not match any declaration")]
        span: SourceSpan,
    },

    #[error("inheritance cycle through '{name}'")]
    #[diagnostic(code(E2016))]
    HeritageCycle {
        name: String,
        #[label("class inherits from itself")]
        span: SourceSpan,
    },

    #[error("'{name}' is not a class and cannot be inherited")]
    #[diagnostic(code(E2017))]
    HeritageNotClass {
        name: String,
        #[label("not a class")]
        span: SourceSpan,
    },

    #[error("entry class 'System' not found")]
    #[diagnostic(code(E2018))]
    EntryClassMissing {
        #[label("module has no 'System' class")]
        span: SourceSpan,
    },

    #[error("class '{name}' has no 'Constructor' to start from")]
    #[diagnostic(code(E2019))]
    EntryConstructorMissing {
        name: String,
        #[label("entry class declared here")]
        span: SourceSpan,
    },

    #[error("cannot load module '{path}': {detail}")]
    #[diagnostic(code(E2020))]
    ModuleLoad {
        path: String,
        detail: String,
        #[label("imported here")]
        span: SourceSpan,
    },
}
