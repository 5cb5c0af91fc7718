use folioterm_core::{Result, runtime_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One portfolio project as shown by `/projects` and `/project <name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub status: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_demo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascii_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl Project {
    /// Lookup key: lower-cased, whitespace runs collapsed to `_`.
    pub fn slug(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Read-only project listing. Seeded in code; a workspace can replace the
/// seed by dropping a `projects.json` array into its runtime dir.
#[derive(Debug, Clone)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    pub fn builtin() -> Self {
        Self {
            projects: seed_projects(),
        }
    }

    /// Load the workspace override when present, the builtin seed otherwise.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = runtime_dir(workspace).join("projects.json");
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let raw = fs::read_to_string(&path)?;
        let projects: Vec<Project> = serde_json::from_str(&raw)?;
        Ok(Self { projects })
    }

    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    /// Case-insensitive, whitespace/underscore-normalized lookup.
    pub fn find(&self, name: &str) -> Option<&Project> {
        let wanted = normalize_name(&name.replace('_', " "));
        self.projects.iter().find(|p| p.slug() == wanted)
    }
}

fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            id: "1".to_string(),
            name: "AI Portfolio Terminal".to_string(),
            description: "Interactive AI-powered portfolio with a retro terminal interface and real-time chat".to_string(),
            tech_stack: vec![
                "Rust".to_string(),
                "ratatui".to_string(),
                "reqwest".to_string(),
            ],
            status: "completed".to_string(),
            category: "systems".to_string(),
            github_url: Some("https://github.com/example/folioterm".to_string()),
            live_demo: None,
            ascii_art: Some(
                "    ┌─────────────┐\n    │ > /help     │\n    │ > /projects │\n    │ > AI Chat   │\n    └─────────────┘".to_string(),
            ),
            code_snippet: Some(
                "let result = processor.process(&input, session.history());\nsession.finish(result);".to_string(),
            ),
        },
        Project {
            id: "2".to_string(),
            name: "Neural Network Visualizer".to_string(),
            description: "Interactive 3D visualization of neural network architectures with live training views".to_string(),
            tech_stack: vec![
                "Python".to_string(),
                "TensorFlow".to_string(),
                "Three.js".to_string(),
                "WebGL".to_string(),
            ],
            status: "completed".to_string(),
            category: "ai_ml".to_string(),
            github_url: Some("https://github.com/example/neural-viz".to_string()),
            live_demo: Some("https://neural-viz.example.com".to_string()),
            ascii_art: Some(
                "    ┌─○─○─○─┐\n    │ │ │ │ │\n    ├─○─○─○─┤\n    │ │ │ │ │\n    └─○─○─○─┘\n   INPUT → OUTPUT".to_string(),
            ),
            code_snippet: Some(
                "def visualize_network(model):\n    for i, layer in enumerate(model.layers):\n        render_layer_3d(layer.units, i)".to_string(),
            ),
        },
        Project {
            id: "3".to_string(),
            name: "E-Commerce Platform".to_string(),
            description: "Full-stack e-commerce solution with payment integration and an admin dashboard".to_string(),
            tech_stack: vec![
                "React".to_string(),
                "Node.js".to_string(),
                "MongoDB".to_string(),
                "Stripe API".to_string(),
            ],
            status: "completed".to_string(),
            category: "web_development".to_string(),
            github_url: Some("https://github.com/example/ecommerce-platform".to_string()),
            live_demo: Some("https://shop.example.com".to_string()),
            ascii_art: None,
            code_snippet: Some(
                "const intent = await stripe.paymentIntents.create({\n  amount: order.total * 100,\n  currency: 'usd',\n});".to_string(),
            ),
        },
        Project {
            id: "4".to_string(),
            name: "Real-time Chat Application".to_string(),
            description: "WebSocket-based chat with rooms, file sharing and reactions".to_string(),
            tech_stack: vec![
                "Socket.io".to_string(),
                "React".to_string(),
                "Redis".to_string(),
            ],
            status: "in_progress".to_string(),
            category: "web_development".to_string(),
            github_url: Some("https://github.com/example/realtime-chat".to_string()),
            live_demo: None,
            ascii_art: Some(
                "    ┌─────────────┐\n    │ User1: Hi!  │\n    │ User2: Hey! │\n    │ [typing...] │\n    └─────────────┘".to_string(),
            ),
            code_snippet: None,
        },
        Project {
            id: "5".to_string(),
            name: "Machine Learning API".to_string(),
            description: "RESTful API for image classification and sentiment analysis with pre-trained models".to_string(),
            tech_stack: vec![
                "Python".to_string(),
                "FastAPI".to_string(),
                "Docker".to_string(),
            ],
            status: "completed".to_string(),
            category: "ai_ml".to_string(),
            github_url: Some("https://github.com/example/ml-api".to_string()),
            live_demo: None,
            ascii_art: None,
            code_snippet: Some(
                "@app.post('/classify-image')\nasync def classify_image(file: UploadFile):\n    return model.predict(await process_image(file))".to_string(),
            ),
        },
    ]
}
