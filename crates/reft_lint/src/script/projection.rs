//! Read-only projections of modules for scripts.
//!
//! Entities go through their serde projection, so scripts see the same
//! field names as `reft dump`. Processes are reshaped for lookup:
//!
//! ```text
//! process.directives.<kind>      // e.g. directives.publish_dir
//! process.inputs.<qualifier>s    // vals, paths, files, envs, stdins, eaches, tuples
//! process.outputs.<qualifier>s   // vals, paths, files, envs, stdouts, evals, tuples
//! ```
//!
//! Every directive kind and every qualifier is present, so an absent one
//! reads as an empty array.

use super::env::RhaiResultOf;
use reft_nf::directives::DIRECTIVE_NAMES;
use reft_nf::{Directive, DirectiveKind, Input, Module, Output, Process};
use rhai::serde::to_dynamic;
use rhai::{Array, Dynamic, Map, INT};
use serde::Serialize;
use std::collections::BTreeMap;

const INPUT_QUALIFIERS: &[&str] = &["val", "path", "file", "env", "stdin", "each", "tuple"];
const OUTPUT_QUALIFIERS: &[&str] = &["val", "path", "file", "env", "stdout", "eval", "tuple"];

/// `publishDir` -> `publish_dir`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn plural(qualifier: &str) -> String {
    match qualifier {
        "each" => "eaches".to_string(),
        q => format!("{}s", q),
    }
}

/// The key a directive is grouped under.
fn directive_key(directive: &Directive) -> String {
    match &directive.kind {
        DirectiveKind::Dynamic { .. } => "dynamic".to_string(),
        DirectiveKind::Unknown { .. } => "unknown".to_string(),
        kind => snake_case(kind.name()),
    }
}

fn frozen(value: impl Serialize) -> RhaiResultOf<Dynamic> {
    Ok(to_dynamic(value)?.into_read_only())
}

fn frozen_map(map: Map) -> Dynamic {
    Dynamic::from_map(map).into_read_only()
}

/// Groups projected items under keys, every key in `keys` present.
fn grouped<'a, T: Serialize + 'a>(
    keys: impl IntoIterator<Item = String>,
    items: impl IntoIterator<Item = (String, &'a T)>,
) -> RhaiResultOf<Dynamic> {
    let mut groups: BTreeMap<String, Array> =
        keys.into_iter().map(|key| (key, Array::new())).collect();
    for (key, item) in items {
        groups.entry(key).or_default().push(frozen(item)?);
    }
    let map: Map = groups
        .into_iter()
        .map(|(key, list)| (key.into(), Dynamic::from_array(list).into_read_only()))
        .collect();
    Ok(frozen_map(map))
}

fn directives(process: &Process) -> RhaiResultOf<Dynamic> {
    let keys = DIRECTIVE_NAMES
        .iter()
        .map(|name| snake_case(name))
        .chain(["dynamic".to_string(), "unknown".to_string()]);
    grouped(
        keys,
        process.directives.iter().map(|d| (directive_key(d), d)),
    )
}

fn inputs(items: &[Input]) -> RhaiResultOf<Dynamic> {
    grouped(
        INPUT_QUALIFIERS.iter().map(|q| plural(q)),
        items.iter().map(|i| (plural(i.kind.qualifier()), i)),
    )
}

fn outputs(items: &[Output]) -> RhaiResultOf<Dynamic> {
    grouped(
        OUTPUT_QUALIFIERS.iter().map(|q| plural(q)),
        items.iter().map(|o| (plural(o.kind.qualifier()), o)),
    )
}

/// The projection of one process.
pub fn process(process: &Process) -> RhaiResultOf<Dynamic> {
    let mut map = Map::new();
    map.insert("name".into(), process.name.clone().into());
    map.insert("line".into(), (process.line as INT).into());
    map.insert("when".into(), frozen(&process.when)?);
    map.insert("script_kind".into(), frozen(process.script_kind)?);
    map.insert("errors".into(), frozen(&process.errors)?);
    map.insert("directives".into(), directives(process)?);
    map.insert("inputs".into(), inputs(&process.inputs)?);
    map.insert("outputs".into(), outputs(&process.outputs)?);
    Ok(frozen_map(map))
}

/// The projection handed to `rule_*` functions.
pub fn module(module: &Module) -> RhaiResultOf<Dynamic> {
    let processes = module
        .processes
        .iter()
        .map(process)
        .collect::<RhaiResultOf<Array>>()?;

    let mut map = Map::new();
    map.insert("path".into(), module.path.display().to_string().into());
    map.insert("dsl_version".into(), (module.dsl_version as INT).into());
    map.insert(
        "processes".into(),
        Dynamic::from_array(processes).into_read_only(),
    );
    map.insert("workflows".into(), frozen(&module.workflows)?);
    map.insert("includes".into(), frozen(&module.includes)?);
    map.insert("params".into(), frozen(&module.params)?);
    Ok(frozen_map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::env::base_engine;
    use reft_nf::ModuleBuilder;
    use rhai::Scope;
    use std::any::Any;

    const SOURCE: &str = r#"include { TRIM } from './trim'

process ALIGN {
    label 'process_high'
    publishDir "${params.outdir}/align", mode: 'copy'
    cpus 8

    input:
    tuple val(meta), path(reads)
    path index

    output:
    path '*.bam', emit: bam
    val 'done', emit: status, optional: true, topic: 'report'

    script:
    """
    align ${reads}
    """
}
"#;

    fn eval<T: Any + Clone + Send + Sync>(expr: &str) -> T {
        let built = ModuleBuilder::new("/p/main.nf").build_source(SOURCE).unwrap();
        let mut scope = Scope::new();
        scope.push_constant("m", module(&built).unwrap());
        base_engine()
            .eval_with_scope::<T>(&mut scope, expr)
            .unwrap()
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("publishDir"), "publish_dir");
        assert_eq!(snake_case("stageInMode"), "stage_in_mode");
        assert_eq!(snake_case("cpus"), "cpus");
    }

    #[test]
    fn test_directives_grouped_by_kind() {
        assert_eq!(eval::<INT>("m.processes[0].directives.cpus[0].num"), 8);
        assert_eq!(eval::<String>("m.processes[0].directives.label[0].label"), "process_high");
        assert_eq!(eval::<String>("m.processes[0].directives.publish_dir[0].mode"), "copy");
        assert_eq!(eval::<INT>("m.processes[0].directives.memory.len()"), 0);
    }

    #[test]
    fn test_channels_grouped_by_qualifier() {
        assert_eq!(eval::<INT>("m.processes[0].inputs.tuples.len()"), 1);
        assert_eq!(eval::<INT>("m.processes[0].inputs.paths.len()"), 1);
        assert_eq!(eval::<INT>("m.processes[0].inputs.eaches.len()"), 0);
        assert_eq!(eval::<String>("m.processes[0].outputs.vals[0].topic"), "report");
        assert!(eval::<bool>("m.processes[0].outputs.vals[0].optional"));
        assert_eq!(eval::<String>("m.processes[0].outputs.paths[0].emit"), "bam");
    }

    #[test]
    fn test_module_fields() {
        assert_eq!(eval::<String>("m.path"), "/p/main.nf");
        assert_eq!(eval::<INT>("m.dsl_version"), 2);
        assert_eq!(eval::<String>("m.includes[0].items[0].name"), "TRIM");
        assert_eq!(eval::<String>("m.params[0].name"), "outdir");
        assert_eq!(eval::<String>("m.processes[0].script_kind"), "script");
    }

    #[test]
    fn test_projection_is_read_only() {
        let built = ModuleBuilder::new("/p/main.nf").build_source(SOURCE).unwrap();
        assert!(module(&built).unwrap().is_read_only());
        assert!(process(&built.processes[0]).unwrap().is_read_only());
    }
}
