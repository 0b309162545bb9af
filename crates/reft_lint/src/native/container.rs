//! Container image rules.

use super::{LintResult, NativeRule};
use reft_nf::{Container, DirectiveKind, Module};

/// Every container directive in the module, with its line.
fn containers(module: &Module) -> impl Iterator<Item = (&Container, u32)> {
    module.processes.iter().flat_map(|p| {
        p.directives.iter().filter_map(|d| match &d.kind {
            DirectiveKind::Container(c) => Some((c, d.line)),
            _ => None,
        })
    })
}

/// Image names may not contain spaces.
pub struct ContainerWithSpace;

impl NativeRule for ContainerWithSpace {
    fn id(&self) -> &'static str {
        "container-with-space"
    }

    fn description(&self) -> &'static str {
        "Container names must not contain spaces"
    }

    fn check_module(&self, module: &Module) -> LintResult {
        for (container, line) in containers(module) {
            if let Some(name) = container.names().into_iter().find(|n| n.contains(' ')) {
                return LintResult::error(
                    module,
                    line,
                    format!("container name '{}' contains spaces, which is not allowed", name),
                );
            }
        }
        LintResult::default()
    }
}

/// A Docker image and a Singularity URL written into one string.
pub struct MultipleContainers;

impl NativeRule for MultipleContainers {
    fn id(&self) -> &'static str {
        "multiple-containers"
    }

    fn description(&self) -> &'static str {
        "Docker and Singularity images belong in separate ternary arms"
    }

    fn check_module(&self, module: &Module) -> LintResult {
        for (container, line) in containers(module) {
            let mixed = container.names().into_iter().any(|name| {
                name.contains("biocontainers/")
                    && (name.contains("https://containers") || name.contains("https://depot"))
            });
            if mixed {
                return LintResult::warning(
                    module,
                    line,
                    "Docker and Singularity containers specified on the same line",
                );
            }
        }
        LintResult::default()
    }
}

/// Images must carry a version tag.
pub struct MustBeTagged;

impl NativeRule for MustBeTagged {
    fn id(&self) -> &'static str {
        "must-be-tagged"
    }

    fn description(&self) -> &'static str {
        "Docker and Singularity images must be pinned to a tag"
    }

    fn check_module(&self, module: &Module) -> LintResult {
        for (container, line) in containers(module) {
            for name in container.names() {
                let checked = match engine(name) {
                    Some(Engine::Singularity) => singularity_tag(name).map(|_| ()),
                    Some(Engine::Docker) => docker_tag(name).and_then(|_| no_registry(name)),
                    None => Ok(()),
                };
                if let Err(message) = checked {
                    return LintResult::error(module, line, message);
                }
            }
        }
        LintResult::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Engine {
    Docker,
    Singularity,
}

fn engine(name: &str) -> Option<Engine> {
    if name.starts_with("https://") {
        return Some(Engine::Singularity);
    }
    let docker = name.contains('/')
        && name.matches(':').count() == 1
        && !name.contains(' ')
        && !name.contains("https://");
    docker.then_some(Engine::Docker)
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn docker_tag(name: &str) -> Result<&str, String> {
    let (_, tag) = name
        .rsplit_once(':')
        .ok_or_else(|| "no docker tag found".to_string())?;
    if is_valid_tag(tag) {
        Ok(tag)
    } else {
        Err("invalid docker tag format".to_string())
    }
}

fn no_registry(name: &str) -> Result<(), String> {
    if name.starts_with("quay.io") {
        Err("please use 'organisation/container:tag' format instead of full registry URL".to_string())
    } else {
        Ok(())
    }
}

/// The tag of a Singularity image URL: `...:<tag>` or `..._v<digit>...`
/// on the last path segment, after dropping `.img`/`.sif`.
fn singularity_tag(url: &str) -> Result<&str, String> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let path = rest.split_once('/').map_or("", |(_, path)| path);
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return Err("invalid container URL: no path segments".to_string());
    }

    let segment = segment.strip_suffix(".img").unwrap_or(segment);
    let segment = segment.strip_suffix(".sif").unwrap_or(segment);

    if let Some((_, tag)) = segment.rsplit_once(':') {
        if is_valid_tag(tag) {
            return Ok(tag);
        }
    }
    if let Some(idx) = segment.rfind("_v") {
        let tag = &segment[idx + 1..];
        if tag[1..].starts_with(|c: char| c.is_ascii_digit()) && is_valid_tag(tag) {
            return Ok(tag);
        }
    }
    Err("unsupported singularity container URL format".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_nf::ModuleBuilder;

    fn lint(rule: &dyn NativeRule, container: &str) -> LintResult {
        let source = format!("process FOO {{\n    container {}\n    script:\n    'echo'\n}}\n", container);
        let module = ModuleBuilder::new("/p/main.nf").build_source(&source).unwrap();
        rule.check_module(&module)
    }

    #[test]
    fn test_container_with_space() {
        let result = lint(&ContainerWithSpace, "'ubuntu latest'");
        let error = result.error.unwrap();
        assert_eq!(
            error.message,
            "container name 'ubuntu latest' contains spaces, which is not allowed"
        );
        assert_eq!(error.line, 2);

        assert!(lint(&ContainerWithSpace, "'ubuntu-latest'").is_clean());
    }

    #[test]
    fn test_multiple_containers() {
        let result = lint(
            &MultipleContainers,
            "\"biocontainers/ubuntu https://containers/something\"",
        );
        assert_eq!(
            result.warning.unwrap().message,
            "Docker and Singularity containers specified on the same line"
        );
        assert!(result.error.is_none());
    }

    #[test]
    fn test_engine_detection() {
        assert_eq!(engine("https://depot.galaxyproject.org/x:1"), Some(Engine::Singularity));
        assert_eq!(engine("biocontainers/fastqc:0.12.1--hdfd78af_0"), Some(Engine::Docker));
        assert_eq!(engine("ubuntu"), None);
        assert_eq!(engine("a/b:c:d"), None);
    }

    #[test]
    fn test_docker_tags() {
        assert_eq!(docker_tag("biocontainers/fastqc:0.12.1--hdfd78af_0"), Ok("0.12.1--hdfd78af_0"));
        assert_eq!(docker_tag("org/tool:"), Err("invalid docker tag format".to_string()));
        assert_eq!(docker_tag("org/tool"), Err("no docker tag found".to_string()));
    }

    #[test]
    fn test_singularity_tags() {
        assert_eq!(
            singularity_tag("https://depot.galaxyproject.org/singularity/fastqc:0.12.1--hdfd78af_0"),
            Ok("0.12.1--hdfd78af_0")
        );
        assert_eq!(
            singularity_tag("https://community-cr-prod.seqera.io/docker/registry/v2/blobs/sha256/ab/abc/data_v2.img"),
            Ok("v2")
        );
        assert_eq!(
            singularity_tag("https://depot.galaxyproject.org/singularity/fastqc"),
            Err("unsupported singularity container URL format".to_string())
        );
        assert_eq!(
            singularity_tag("https://depot.galaxyproject.org"),
            Err("invalid container URL: no path segments".to_string())
        );
    }

    #[test]
    fn test_must_be_tagged() {
        assert!(lint(&MustBeTagged, "'biocontainers/fastqc:0.12.1--hdfd78af_0'").is_clean());

        let quay = lint(&MustBeTagged, "'quay.io/biocontainers/fastqc:0.12.1'");
        assert_eq!(
            quay.error.unwrap().message,
            "please use 'organisation/container:tag' format instead of full registry URL"
        );

        let ternary = lint(
            &MustBeTagged,
            "\"${ workflow.containerEngine == 'singularity' ? 'https://depot.galaxyproject.org/singularity/fastqc' : 'biocontainers/fastqc:0.12.1' }\"",
        );
        assert_eq!(
            ternary.error.unwrap().message,
            "unsupported singularity container URL format"
        );
    }
}
