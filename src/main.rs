//! Mentat demo application.
//!
//! Serves the application found under `./server`:
//!
//! ```text
//! server/
//!   config/settings.toml      server, auth, mail, sockets, observability
//!   config/database.toml      one table per APP_ENV
//!   config/routes.toml        extra routes onto registered handlers
//!   config/validator.toml     named validation rule sets
//!   handlers/<Name>.*.toml    routes for the handler registered as <Name>
//! ```

use std::any::Any;

use axum::http::StatusCode;
use serde_json::{json, Value};

use mentat::config::loader::load_settings;
use mentat::config::AppLayout;
use mentat::config::DatabaseConfig;
use mentat::mail::Mail;
use mentat::observability::logging;
use mentat::{
    respond, ActionError, AppContext, Association, Controller, Handler, Mentat, Model, RequestContext,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let layout = AppLayout::default();
    let settings = load_settings(&layout)?;
    logging::init(&settings.observability);

    tracing::info!("mentat v{} starting", env!("CARGO_PKG_VERSION"));

    let mentat = Mentat::builder()
        .root(layout.root())
        .settings(settings)
        .model(Users::new)
        .model(|_: &DatabaseConfig| Posts)
        .method("time", |_app, _args| async {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            Ok(json!({ "now": now }))
        })
        .controller(greetings())
        .handler(basic_http())
        .handler(controllers())
        .socket_plugin("echo", |socket| {
            socket.on("echo", |handle, data| async move {
                handle.emit("echo", data);
            });
        })
        .load()?;

    mentat.start().await?;
    Ok(())
}

fn basic_http() -> Handler {
    Handler::new("BasicHTTP")
        .function("test200", |_request| async { StatusCode::OK })
        .function("defaultResponderError", |_request| async {
            respond(Err(ActionError::new("Something went wrong")))
        })
}

fn controllers() -> Handler {
    Handler::new("Controllers")
        .function("simpleResponse", |request: RequestContext| async move {
            let options = request.payload.clone().unwrap_or(Value::Null);
            respond(request.app().call("Greetings", "hello", options).await)
        })
        .function("welcome", |request: RequestContext| async move {
            let Some(to) = request.query_param("to") else {
                return respond(Err(ActionError::new("Missing recipient")));
            };
            let mail = Mail::new(to, "Welcome", "Thanks for signing up.");
            match request.app().transporter().send(mail).await {
                Ok(sent) => respond(Ok(Some(json!({ "messageId": sent.message_id })))),
                Err(e) => respond(Err(ActionError::new(e.to_string()))),
            }
        })
}

fn greetings() -> Controller {
    Controller::new("Greetings")
        .action("hello", |app: AppContext, options: Value| async move {
            let name = options.get("name").and_then(Value::as_str).unwrap_or("world");
            let time = app.method("time", Value::Null).await?;
            let database = app
                .models()
                .get_as::<Users>("User")
                .map(|users| users.database.clone());
            Ok(Some(json!({
                "greeting": format!("hello {name}"),
                "at": time["now"],
                "database": database,
            })))
        })
        .action("nothing", |_app, _options| async { Ok(None) })
}

#[derive(Debug)]
struct Users {
    database: String,
}

impl Users {
    fn new(database: &DatabaseConfig) -> Self {
        Self {
            database: database.database.clone(),
        }
    }
}

impl Model for Users {
    fn name(&self) -> &str {
        "User"
    }

    fn associations(&self) -> Vec<Association> {
        vec![Association::has_many("Post").foreign_key("authorId")]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct Posts;

impl Model for Posts {
    fn name(&self) -> &str {
        "Post"
    }

    fn associations(&self) -> Vec<Association> {
        vec![Association::belongs_to("User").foreign_key("authorId")]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
