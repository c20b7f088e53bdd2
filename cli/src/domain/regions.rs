//! Regions where Vertex AI training and deployment are available.

pub const SUPPORTED_REGIONS: &[&str] = &[
    "us-central1",
    "europe-west4",
    "asia-east1",
    "asia-northeast1",
    "asia-northeast3",
    "asia-southeast1",
    "australia-southeast1",
    "europe-west1",
    "europe-west2",
    "northamerica-northeast1",
    "us-west1",
    "us-east1",
    "us-east4",
];

#[must_use]
pub fn is_supported_region(region: &str) -> bool {
    SUPPORTED_REGIONS.contains(&region)
}
