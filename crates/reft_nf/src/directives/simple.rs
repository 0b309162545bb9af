//! Extractors for directives with scalar payloads.

use super::DirectiveKind;
use crate::args::{
    const_bool, const_int, const_string, quantity_text, string_or_gstring, CallArgs,
};
use reft_ast::{Constant, Expr, ExprKind, MethodCall};

/// Extracts every directive that is not `container`, `memory` or
/// `publishDir`. Returns `None` when the value cannot be resolved.
pub(super) fn extract(name: &str, call: &MethodCall) -> Option<DirectiveKind> {
    let args = CallArgs::of(call);
    let single = args.single();

    let kind = match name {
        "accelerator" => DirectiveKind::Accelerator {
            num_gpus: single.and_then(const_int)?,
            gpu_type: args.named("type").and_then(const_string),
        },
        "afterScript" => DirectiveKind::AfterScript {
            script: single.and_then(string_or_gstring)?,
        },
        "arch" => DirectiveKind::Arch {
            name: single.and_then(const_string)?,
            target: args.named("target").and_then(const_string),
        },
        "array" => DirectiveKind::Array {
            size: single.and_then(const_int)?,
        },
        "beforeScript" => DirectiveKind::BeforeScript {
            script: single.and_then(string_or_gstring)?,
        },
        "cache" => cache(single?)?,
        "clusterOptions" => DirectiveKind::ClusterOptions {
            options: single.and_then(string_or_gstring)?,
        },
        "conda" => conda(single?)?,
        "containerOptions" => DirectiveKind::ContainerOptions {
            options: single.and_then(string_or_gstring)?,
        },
        "cpus" => DirectiveKind::Cpus {
            num: single.and_then(const_int)?,
        },
        "debug" => DirectiveKind::Debug {
            enabled: single.and_then(const_bool)?,
        },
        "disk" => DirectiveKind::Disk {
            space: single.and_then(quantity_text)?,
        },
        "echo" => DirectiveKind::Echo {
            enabled: single.and_then(const_bool)?,
        },
        "errorStrategy" => DirectiveKind::ErrorStrategy {
            strategy: single.and_then(const_string)?,
        },
        "executor" => DirectiveKind::Executor {
            executor: single.and_then(const_string)?,
        },
        "ext" => DirectiveKind::Ext {
            version: args.named("version").and_then(string_or_gstring)?,
            args: args.named("args").and_then(string_or_gstring),
        },
        "fair" => DirectiveKind::Fair {
            enabled: single.and_then(const_bool)?,
        },
        "label" => DirectiveKind::Label {
            label: single.and_then(const_string)?,
        },
        "machineType" => DirectiveKind::MachineType {
            machine_type: single.and_then(string_or_gstring)?,
        },
        "maxErrors" => DirectiveKind::MaxErrors {
            num: single.and_then(const_int)?,
        },
        "maxForks" => DirectiveKind::MaxForks {
            num: single.and_then(const_int)?,
        },
        "maxRetries" => DirectiveKind::MaxRetries {
            num: single.and_then(const_int)?,
        },
        "maxSubmitAwait" => DirectiveKind::MaxSubmitAwait {
            value: single.and_then(quantity_text)?,
        },
        "module" => DirectiveKind::Module {
            name: single.and_then(string_or_gstring)?,
        },
        "penv" => DirectiveKind::Penv {
            environment: single.and_then(string_or_gstring)?,
        },
        "pod" => DirectiveKind::Pod {
            env: args.named("env").and_then(string_or_gstring)?,
            value: args.named("value").and_then(string_or_gstring)?,
        },
        "queue" => DirectiveKind::Queue {
            name: single.and_then(string_or_gstring)?,
        },
        "resourceLabels" => DirectiveKind::ResourceLabels {
            keys: resource_label_keys(&args)?,
        },
        "resourceLimits" => resource_limits(&args)?,
        "scratch" => scratch(single?)?,
        "shell" => DirectiveKind::Shell {
            command: shell_command(&args)?,
        },
        "spack" => DirectiveKind::Spack {
            dependencies: single.and_then(string_or_gstring)?,
        },
        "stageInMode" => DirectiveKind::StageInMode {
            mode: single.and_then(const_string)?,
        },
        "stageOutMode" => DirectiveKind::StageOutMode {
            mode: single.and_then(const_string)?,
        },
        "storeDir" => DirectiveKind::StoreDir {
            directory: single.and_then(string_or_gstring)?,
        },
        "tag" => DirectiveKind::Tag {
            tag: single.and_then(string_or_gstring)?,
        },
        "time" => DirectiveKind::Time {
            duration: single.and_then(quantity_text)?,
        },
        _ => return None,
    };
    Some(kind)
}

fn cache(value: &Expr) -> Option<DirectiveKind> {
    let (enabled, deep, lenient) = match &value.kind {
        ExprKind::Constant(Constant::Bool(enabled)) => (*enabled, false, false),
        ExprKind::Constant(Constant::String(mode)) => match mode.as_str() {
            "deep" => (true, true, false),
            "lenient" => (true, false, true),
            _ => return None,
        },
        _ => return None,
    };
    Some(DirectiveKind::Cache {
        enabled,
        deep,
        lenient,
    })
}

fn conda(value: &Expr) -> Option<DirectiveKind> {
    let arm = |expr: &Expr| match &expr.kind {
        ExprKind::Constant(Constant::Null) => Some(String::new()),
        _ => string_or_gstring(expr),
    };

    match &value.kind {
        ExprKind::Ternary {
            then_expr,
            else_expr,
            ..
        } => {
            let alternatives = vec![arm(then_expr)?, arm(else_expr)?];
            Some(DirectiveKind::Conda {
                dependencies: alternatives[0].clone(),
                alternatives,
            })
        }
        _ => Some(DirectiveKind::Conda {
            dependencies: arm(value)?,
            alternatives: Vec::new(),
        }),
    }
}

fn scratch(value: &Expr) -> Option<DirectiveKind> {
    match &value.kind {
        ExprKind::Constant(Constant::Bool(enabled)) => Some(DirectiveKind::Scratch {
            enabled: *enabled,
            directory: None,
        }),
        _ => string_or_gstring(value).map(|directory| DirectiveKind::Scratch {
            enabled: true,
            directory: Some(directory),
        }),
    }
}

fn resource_limits(args: &CallArgs<'_>) -> Option<DirectiveKind> {
    if args.named.is_empty() {
        return None;
    }
    Some(DirectiveKind::ResourceLimits {
        cpus: args.named("cpus").and_then(const_int),
        disk: args.named("disk").and_then(quantity_text),
        memory: args.named("memory").and_then(quantity_text),
        time: args.named("time").and_then(quantity_text),
    })
}

fn resource_label_keys(args: &CallArgs<'_>) -> Option<Vec<String>> {
    if args.named.is_empty() {
        return None;
    }
    Some(args.named.iter().map(|(key, _)| key.to_string()).collect())
}

/// `shell '/bin/bash', '-euo', 'pipefail'` or the same as a list.
fn shell_command(args: &CallArgs<'_>) -> Option<String> {
    let words: Vec<&Expr> = match args.positional.as_slice() {
        [list] => match &list.kind {
            ExprKind::List(items) => items.iter().collect(),
            _ => vec![*list],
        },
        positional => positional.to_vec(),
    };
    let words: Option<Vec<String>> = words.into_iter().map(const_string).collect();
    words.filter(|w| !w.is_empty()).map(|w| w.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    fn kind(source: &str) -> Option<DirectiveKind> {
        let file = parse_source(source).unwrap();
        let stmt = file.statements().next().unwrap();
        let call = stmt.as_expr().and_then(|e| e.as_method_call()).unwrap();
        extract(&call.method, call)
    }

    #[test]
    fn test_label_and_tag() {
        assert_eq!(
            kind("label 'process_medium'"),
            Some(DirectiveKind::Label {
                label: "process_medium".into()
            })
        );
        assert_eq!(
            kind("tag \"$meta.id\""),
            Some(DirectiveKind::Tag {
                tag: "$meta.id".into()
            })
        );
    }

    #[test]
    fn test_label_requires_constant() {
        assert_eq!(kind("label \"${params.x}\""), None);
    }

    #[test]
    fn test_cache_modes() {
        assert_eq!(
            kind("cache 'lenient'"),
            Some(DirectiveKind::Cache {
                enabled: true,
                deep: false,
                lenient: true
            })
        );
        assert_eq!(
            kind("cache false"),
            Some(DirectiveKind::Cache {
                enabled: false,
                deep: false,
                lenient: false
            })
        );
        assert_eq!(kind("cache 'sometimes'"), None);
    }

    #[test]
    fn test_conda_ternary() {
        let Some(DirectiveKind::Conda {
            dependencies,
            alternatives,
        }) = kind("conda (params.enable_conda ? 'bioconda::fastqc=0.11.9' : null)")
        else {
            panic!("expected conda");
        };
        assert_eq!(dependencies, "bioconda::fastqc=0.11.9");
        assert_eq!(alternatives, vec!["bioconda::fastqc=0.11.9".to_string(), String::new()]);
    }

    #[test]
    fn test_conda_environment_file() {
        assert_eq!(
            kind("conda \"${moduleDir}/environment.yml\""),
            Some(DirectiveKind::Conda {
                dependencies: "${moduleDir}/environment.yml".into(),
                alternatives: Vec::new(),
            })
        );
    }

    #[test]
    fn test_accelerator_and_arch() {
        assert_eq!(
            kind("accelerator 4, type: 'nvidia-tesla-k80'"),
            Some(DirectiveKind::Accelerator {
                num_gpus: 4,
                gpu_type: Some("nvidia-tesla-k80".into())
            })
        );
        assert_eq!(
            kind("arch 'linux/x86_64', target: 'cascadelake'"),
            Some(DirectiveKind::Arch {
                name: "linux/x86_64".into(),
                target: Some("cascadelake".into())
            })
        );
        assert_eq!(kind("accelerator type: 'x'"), None);
    }

    #[test]
    fn test_time_and_disk_quantities() {
        assert_eq!(
            kind("time '2h'"),
            Some(DirectiveKind::Time {
                duration: "2h".into()
            })
        );
        assert_eq!(
            kind("disk 100.GB"),
            Some(DirectiveKind::Disk {
                space: "100.GB".into()
            })
        );
    }

    #[test]
    fn test_ext_and_pod() {
        assert_eq!(
            kind("ext version: '2.1', args: '--fast'"),
            Some(DirectiveKind::Ext {
                version: "2.1".into(),
                args: Some("--fast".into())
            })
        );
        assert_eq!(kind("ext args: '--fast'"), None);
        assert_eq!(
            kind("pod env: 'FOO', value: 'bar'"),
            Some(DirectiveKind::Pod {
                env: "FOO".into(),
                value: "bar".into()
            })
        );
    }

    #[test]
    fn test_resource_limits() {
        assert_eq!(
            kind("resourceLimits cpus: 24, memory: 768.GB, time: '72h'"),
            Some(DirectiveKind::ResourceLimits {
                cpus: Some(24),
                disk: None,
                memory: Some("768.GB".into()),
                time: Some("72h".into()),
            })
        );
    }

    #[test]
    fn test_resource_labels() {
        assert_eq!(
            kind("resourceLabels region: 'eu-west-1', user: 'me'"),
            Some(DirectiveKind::ResourceLabels {
                keys: vec!["region".into(), "user".into()]
            })
        );
    }

    #[test]
    fn test_scratch() {
        assert_eq!(
            kind("scratch '/tmp/work'"),
            Some(DirectiveKind::Scratch {
                enabled: true,
                directory: Some("/tmp/work".into())
            })
        );
        assert_eq!(
            kind("scratch false"),
            Some(DirectiveKind::Scratch {
                enabled: false,
                directory: None
            })
        );
    }

    #[test]
    fn test_shell_words() {
        assert_eq!(
            kind("shell '/bin/bash', '-euo', 'pipefail'"),
            Some(DirectiveKind::Shell {
                command: "/bin/bash -euo pipefail".into()
            })
        );
        assert_eq!(
            kind("shell(['/bin/bash', '-eu'])"),
            Some(DirectiveKind::Shell {
                command: "/bin/bash -eu".into()
            })
        );
    }

    #[test]
    fn test_int_and_bool_directives() {
        assert_eq!(kind("maxForks 1"), Some(DirectiveKind::MaxForks { num: 1 }));
        assert_eq!(kind("array 100"), Some(DirectiveKind::Array { size: 100 }));
        assert_eq!(kind("debug true"), Some(DirectiveKind::Debug { enabled: true }));
        assert_eq!(kind("cpus '4'"), None);
    }
}
