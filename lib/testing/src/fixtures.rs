use std::fs;
use std::io;

use capability::{StaticRegistry, TemplateStore};
use tempfile::TempDir;

pub const WEBSERVICE: &str = r#"
name: webservice
kind: workload
description: Long-running, scalable, containerized service that has a stable network endpoint
parameters:
  - name: image
    type: string
    required: true
    usage: Which image would you like to use for your service
  - name: cmd
    type: list
    usage: Commands to run in the container
  - name: env
    type: object
    usage: Environment variables for the container
  - name: port
    type: int
    default: 80
    usage: Which port do you want customer traffic sent to
template:
  output:
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: !ref context.name
    spec:
      selector:
        matchLabels:
          app.oam.dev/component: !ref context.name
      template:
        metadata:
          labels:
            app.oam.dev/component: !ref context.name
        spec:
          containers:
            - name: !ref context.name
              image: !ref parameter.image
              command: !ref parameter.cmd
              env: !ref parameter.env
              ports:
                - containerPort: !ref parameter.port
"#;

pub const CLONESET: &str = r#"
name: cloneset
kind: workload
parameters:
  - name: image
    type: string
    required: true
  - name: replicas
    type: int
    default: 1
template:
  output:
    apiVersion: apps.kruise.io/v1alpha1
    kind: CloneSet
    metadata:
      name: !ref context.name
    spec:
      replicas: !ref parameter.replicas
      template:
        spec:
          containers:
            - name: !ref context.name
              image: !ref parameter.image
"#;

pub const AUTOSCALING: &str = r#"
name: autoscaling
kind: trait
parameters:
  - name: min
    type: int
    default: 1
  - name: max
    type: int
    default: 10
  - name: cpu
    type: int
    usage: Target CPU utilization percentage
template:
  output:
    apiVersion: autoscaling/v1
    kind: HorizontalPodAutoscaler
    metadata:
      name: "{{ context.name }}-hpa"
    spec:
      minReplicas: !ref parameter.min
      maxReplicas: !ref parameter.max
      targetCPUUtilizationPercentage: !ref parameter.cpu
"#;

pub const ROLLOUT: &str = r#"
name: rollout
kind: trait
parameters:
  - name: strategy
    type: string
    default: rolling
  - name: step
    type: int
    default: 1
template:
  output:
    apiVersion: standard.oam.dev/v1alpha1
    kind: Rollout
    spec:
      strategy: !ref parameter.strategy
      batchSize: !ref parameter.step
"#;

pub fn definitions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("webservice.yaml", WEBSERVICE),
        ("cloneset.yaml", CLONESET),
        ("autoscaling.yaml", AUTOSCALING),
        ("rollout.yaml", ROLLOUT),
    ]
}

/// Store holding the webservice and cloneset workloads and the autoscaling and rollout traits.
pub fn template_store() -> TemplateStore {
    let definitions: Vec<&str> = definitions().into_iter().map(|(_, d)| d).collect();
    let registry = StaticRegistry::from_definitions(&definitions)
        .expect("fixture definitions should parse");

    TemplateStore::load(&registry).expect("static registry should load")
}

/// Writes every fixture definition into a fresh temporary directory.
pub fn capability_dir() -> io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (file_name, definition) in definitions() {
        fs::write(dir.path().join(file_name), definition)?;
    }

    Ok(dir)
}
