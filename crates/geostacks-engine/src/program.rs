//! Declarative site program builder.
//!
//! A [`SiteProgram`] is the ephemeral resource description handed to the
//! engine on every create call: one storage bucket, a website configuration,
//! an uploaded index page, and a public-read access policy, exporting the
//! bucket's website endpoint as `website_url`. It renders to a Pulumi YAML
//! program document; the engine owns everything downstream of that.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::engine::WEBSITE_URL_OUTPUT;

/// A per-user site program, built fresh from the username on each create.
#[derive(Debug, Clone)]
pub struct SiteProgram {
    project: String,
    username: Option<String>,
}

#[derive(Serialize)]
struct ProgramDoc {
    name: String,
    runtime: &'static str,
    description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    resources: BTreeMap<&'static str, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<&'static str, String>,
}

#[derive(Serialize)]
struct Resource {
    #[serde(rename = "type")]
    resource_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

impl SiteProgram {
    /// The site program for a username: bucket, starter content, public
    /// access policy.
    pub fn new(username: &str, project: &str) -> Self {
        SiteProgram {
            project: project.to_string(),
            username: Some(username.to_string()),
        }
    }

    /// An empty program. Used to select or destroy an existing stack
    /// without describing any resources.
    pub fn noop(project: &str) -> Self {
        SiteProgram {
            project: project.to_string(),
            username: None,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// The bucket name prefix the engine will extend with a unique suffix.
    pub fn bucket_prefix(&self) -> Option<String> {
        self.username.as_ref().map(|name| format!("{name}-site-"))
    }

    /// Render the program as a Pulumi YAML document.
    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        let mut resources = BTreeMap::new();
        let mut outputs = BTreeMap::new();

        if let Some(username) = &self.username {
            resources.insert(
                "site-bucket",
                Resource {
                    resource_type: "aws:s3:BucketV2",
                    properties: Some(json!({
                        "bucketPrefix": format!("{username}-site-"),
                    })),
                    options: None,
                },
            );
            resources.insert(
                "site-website",
                Resource {
                    resource_type: "aws:s3:BucketWebsiteConfigurationV2",
                    properties: Some(json!({
                        "bucket": "${site-bucket.id}",
                        "indexDocument": { "suffix": "index.html" },
                        "errorDocument": { "key": "error.html" },
                    })),
                    options: None,
                },
            );
            resources.insert(
                "site-index",
                Resource {
                    resource_type: "aws:s3:BucketObject",
                    properties: Some(json!({
                        "bucket": "${site-bucket.id}",
                        "key": "index.html",
                        "content": starter_content(username),
                        "contentType": "text/html; charset=utf-8",
                    })),
                    options: None,
                },
            );
            resources.insert(
                "site-public-access",
                Resource {
                    resource_type: "aws:s3:BucketPublicAccessBlock",
                    properties: Some(json!({
                        "bucket": "${site-bucket.id}",
                        "blockPublicAcls": false,
                        "ignorePublicAcls": false,
                        "blockPublicPolicy": false,
                        "restrictPublicBuckets": false,
                    })),
                    options: Some(json!({
                        "dependsOn": ["${site-bucket}"],
                    })),
                },
            );
            resources.insert(
                "site-policy",
                Resource {
                    resource_type: "aws:s3:BucketPolicy",
                    properties: Some(json!({
                        "bucket": "${site-bucket.id}",
                        "policy": {
                            "fn::toJSON": {
                                "Version": "2012-10-17",
                                "Statement": {
                                    "Effect": "Allow",
                                    "Principal": "*",
                                    "Action": ["s3:GetObject"],
                                    "Resource": ["arn:aws:s3:::${site-bucket.id}/*"],
                                },
                            },
                        },
                    })),
                    // Public policies are rejected until the access block
                    // relaxation has applied.
                    options: Some(json!({
                        "dependsOn": ["${site-public-access}"],
                    })),
                },
            );
            outputs.insert(WEBSITE_URL_OUTPUT, "${site-website.websiteEndpoint}".to_string());
        }

        let doc = ProgramDoc {
            name: self.project.clone(),
            runtime: "yaml",
            description: "Per-user static websites".to_string(),
            resources,
            outputs,
        };
        serde_yaml::to_string(&doc)
    }
}

/// Starter index page greeting the user, stamped with the creation time.
fn starter_content(username: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>My GeoStacks Website</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            text-align: center;
            color: #0000ff;
            background-color: #c0c0c0;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Welcome to {username}'s Page</h1>
        <p>Under construction</p>
        <p>Created at: {timestamp}</p>
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_program_renders_all_resources() {
        let program = SiteProgram::new("chris", "GeoStacks");
        let yaml = program.to_yaml().unwrap();
        assert!(yaml.contains("name: GeoStacks"));
        assert!(yaml.contains("runtime: yaml"));
        assert!(yaml.contains("aws:s3:BucketV2"));
        assert!(yaml.contains("aws:s3:BucketWebsiteConfigurationV2"));
        assert!(yaml.contains("aws:s3:BucketObject"));
        assert!(yaml.contains("aws:s3:BucketPublicAccessBlock"));
        assert!(yaml.contains("aws:s3:BucketPolicy"));
        assert!(yaml.contains("chris-site-"));
        assert!(yaml.contains("website_url"));
    }

    #[test]
    fn starter_content_greets_user() {
        let program = SiteProgram::new("chris", "GeoStacks");
        let yaml = program.to_yaml().unwrap();
        assert!(yaml.contains("Welcome to chris's Page"));
        assert!(yaml.contains("Created at:"));
    }

    #[test]
    fn noop_program_has_no_resources() {
        let program = SiteProgram::noop("GeoStacks");
        let yaml = program.to_yaml().unwrap();
        assert!(yaml.contains("name: GeoStacks"));
        assert!(!yaml.contains("resources"));
        assert!(!yaml.contains("outputs"));
        assert!(program.bucket_prefix().is_none());
    }

    #[test]
    fn policy_allows_public_reads() {
        let yaml = SiteProgram::new("ada", "GeoStacks").to_yaml().unwrap();
        assert!(yaml.contains("s3:GetObject"));
        assert!(yaml.contains("fn::toJSON"));
    }
}
