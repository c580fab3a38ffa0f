//! Kubernetes-backed workload and usage sources
//!
//! Pods come from the core API; usage comes from the metrics-server
//! (`metrics.k8s.io/v1beta1`) through a raw request, since it is an
//! aggregated API without generated types.

use anyhow::{Context, Result};
use async_trait::async_trait;
use checker_lib::{
    ContainerKey, ContainerSpec, Quantity, ResourceList, ResourceName, ResourceUsage,
    SourceError, UsageSample, UsageSource, WorkloadSource,
};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Connected cluster client
pub struct KubeClient {
    client: Client,
    cluster: String,
}

impl KubeClient {
    /// Connect using an explicit kubeconfig and/or context, or infer the
    /// configuration (kubeconfig, then in-cluster service account)
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };

        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Invalid kubeconfig")?
            }
            None if context.is_some() => Config::from_kubeconfig(&options)
                .await
                .context("Failed to load kubeconfig context")?,
            None => Config::infer()
                .await
                .context("Could not find kubeconfig and not running in-cluster")?,
        };

        let cluster = context
            .map(str::to_string)
            .or_else(|| config.cluster_url.host().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        debug!(cluster = %cluster, url = %config.cluster_url, "Using Kubernetes configuration");

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self { client, cluster })
    }

    /// Name used to label logs for this cluster
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn workloads(&self) -> PodWorkloadSource {
        PodWorkloadSource {
            client: self.client.clone(),
        }
    }

    pub fn metrics(&self) -> MetricsServerSource {
        MetricsServerSource {
            client: self.client.clone(),
        }
    }
}

/// Lists pod containers from the core API
#[derive(Clone)]
pub struct PodWorkloadSource {
    client: Client,
}

#[async_trait]
impl WorkloadSource for PodWorkloadSource {
    async fn list_containers(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<ContainerSpec>, SourceError> {
        let pods: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| SourceError::Api(format!("Failed to list pods: {}", e)))?;
        debug!(pods = list.items.len(), "Listed pods");

        let now = Utc::now();
        Ok(list
            .items
            .into_iter()
            .flat_map(|pod| pod_containers(pod, now))
            .collect())
    }
}

/// Reads instantaneous usage from the metrics-server
#[derive(Clone)]
pub struct MetricsServerSource {
    client: Client,
}

#[async_trait]
impl UsageSource for MetricsServerSource {
    async fn list_usage(&self, namespace: Option<&str>) -> Result<Vec<UsageSample>, SourceError> {
        let path = match namespace {
            Some(ns) => format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", ns),
            None => "/apis/metrics.k8s.io/v1beta1/pods".to_string(),
        };

        let request = http::Request::builder()
            .method("GET")
            .uri(&path)
            .body(Vec::new())
            .map_err(|e| SourceError::Api(format!("Failed to build request: {}", e)))?;

        let list = self
            .client
            .request::<PodMetricsList>(request)
            .await
            .map_err(|e| match e {
                kube::Error::Api(response) if response.code == 404 => {
                    SourceError::MetricsUnavailable
                }
                other => SourceError::Api(format!("Metrics API error: {}", other)),
            })?;

        Ok(usage_samples(list))
    }
}

/// Convert one pod into a spec per container
fn pod_containers(pod: Pod, now: DateTime<Utc>) -> Vec<ContainerSpec> {
    let namespace = pod
        .metadata
        .namespace
        .unwrap_or_else(|| "default".to_string());
    let name = pod.metadata.name.unwrap_or_default();
    let age = pod
        .metadata
        .creation_timestamp
        .and_then(|created| (now - created.0).to_std().ok())
        .unwrap_or_default();

    let Some(spec) = pod.spec else {
        return Vec::new();
    };

    spec.containers
        .into_iter()
        .map(|container| {
            let key = ContainerKey::new(&namespace, &name, &container.name);
            let resources = container.resources.unwrap_or_default();
            ContainerSpec {
                limits: resource_list(&key, resources.limits),
                requests: resource_list(&key, resources.requests),
                key,
                age,
            }
        })
        .collect()
}

/// Unparseable entries are logged and left out, as if not declared
fn resource_list(
    key: &ContainerKey,
    declared: Option<BTreeMap<String, k8s_openapi::apimachinery::pkg::api::resource::Quantity>>,
) -> ResourceList {
    declared
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, quantity)| match parse_quantity(key, &name, &quantity.0) {
            Ok(parsed) => Some((ResourceName::from(name.as_str()), parsed)),
            Err(e) => {
                warn!(container = %key, error = %e, "Ignoring resource entry");
                None
            }
        })
        .collect()
}

fn parse_quantity(key: &ContainerKey, resource: &str, text: &str) -> Result<Quantity, SourceError> {
    Quantity::parse(text).map_err(|source| SourceError::Quantity {
        container: key.to_string(),
        resource: resource.to_string(),
        source,
    })
}

/// Samples with unparseable usage are logged and dropped; the container
/// is then analyzed as if it had no usage
fn usage_samples(list: PodMetricsList) -> Vec<UsageSample> {
    let mut samples = Vec::new();
    for pod in list.items {
        for container in pod.containers {
            let key = ContainerKey::new(&pod.metadata.namespace, &pod.metadata.name, &container.name);
            let parsed = parse_quantity(&key, "cpu", &container.usage.cpu).and_then(|cpu| {
                let memory = parse_quantity(&key, "memory", &container.usage.memory)?;
                Ok(ResourceUsage::new(cpu.millis(), memory.value()))
            });
            match parsed {
                Ok(usage) => samples.push(UsageSample::new(key, usage)),
                Err(e) => warn!(container = %key, error = %e, "Ignoring usage sample"),
            }
        }
    }
    samples
}

// Wire types for the metrics API

#[derive(Debug, Deserialize)]
struct PodMetricsList {
    items: Vec<PodMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsItem {
    metadata: PodMetricsMetadata,
    containers: Vec<ContainerMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsMetadata {
    name: String,
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct ContainerMetricsItem {
    name: String,
    usage: UsageItem,
}

#[derive(Debug, Deserialize)]
struct UsageItem {
    cpu: String,
    memory: String,
}
