//! In-memory [`MailgunApi`] for tests.
//!
//! Behaves like the remote API closely enough for lifecycle tests: missing
//! resources answer 404, duplicates answer 400, suppression creates upsert.
//! Failures can be injected ahead of any call with [`InMemoryMailgun::fail_next`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use provider_mailgun_domain::{
    qualify_login, ApiError, ApiResult, BounceObservation, BounceParameters, ComplaintObservation,
    ComplaintParameters, DomainObservation, DomainParameters, MailingListObservation,
    MailingListParameters, RouteObservation, RouteParameters, SmtpCredentialObservation,
    SmtpCredentialParameters, TemplateObservation, TemplateParameters, TemplateVersion,
    UnsubscribeObservation, UnsubscribeParameters, WebhookKind, WebhookObservation,
    WebhookParameters,
};

use crate::client::MailgunApi;

type Scoped = (String, String);

#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, DomainObservation>,
    routes: HashMap<String, RouteObservation>,
    lists: HashMap<String, MailingListObservation>,
    webhooks: HashMap<(String, WebhookKind), WebhookObservation>,
    credentials: HashMap<Scoped, (SmtpCredentialObservation, String)>,
    templates: HashMap<Scoped, TemplateObservation>,
    bounces: HashMap<Scoped, BounceObservation>,
    complaints: HashMap<Scoped, ComplaintObservation>,
    unsubscribes: HashMap<Scoped, UnsubscribeObservation>,
    failures: VecDeque<ApiError>,
    calls: HashMap<&'static str, usize>,
    next_id: u64,
}

/// Map-backed fake of the remote API.
#[derive(Debug, Default)]
pub struct InMemoryMailgun {
    state: Mutex<State>,
}

impl InMemoryMailgun {
    /// Empty fake with no injected failures.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `n` calls, whatever the operation, with `err`.
    pub fn fail_next(&self, n: usize, err: ApiError) {
        let mut state = self.lock();
        state.failures.extend(std::iter::repeat(err).take(n));
    }

    /// Calls made to `operation`, including failed ones.
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Calls across every operation.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Current password of an SMTP credential.
    pub fn smtp_password(&self, domain: &str, login: &str) -> Option<String> {
        self.lock()
            .credentials
            .get(&key(domain, &qualify_login(login, domain)))
            .map(|(_, password)| password.clone())
    }

    fn begin(&self, operation: &'static str) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn not_found(method: &str, path: String, what: &str) -> ApiError {
    ApiError::status(method, path, 404, format!("{what} not found"))
}

fn already_exists(path: String, what: &str) -> ApiError {
    ApiError::status("POST", path, 400, format!("{what} already exists"))
}

fn key(domain: &str, id: &str) -> Scoped {
    (domain.to_owned(), id.to_owned())
}

#[async_trait]
impl MailgunApi for InMemoryMailgun {
    async fn create_domain(&self, params: &DomainParameters) -> ApiResult<DomainObservation> {
        params.validate()?;
        let mut state = self.begin("create_domain")?;
        if state.domains.contains_key(&params.name) {
            return Err(already_exists("/v4/domains".into(), "domain"));
        }
        let observed = DomainObservation {
            name: params.name.clone(),
            state: "unverified".into(),
            domain_type: "custom".into(),
            smtp_login: format!("postmaster@{}", params.name),
            spam_action: params.spam_action,
            wildcard: params.wildcard.unwrap_or(false),
            web_scheme: params.web_scheme,
            ..DomainObservation::default()
        };
        state.domains.insert(params.name.clone(), observed.clone());
        Ok(observed)
    }

    async fn get_domain(&self, name: &str) -> ApiResult<DomainObservation> {
        let state = self.begin("get_domain")?;
        state
            .domains
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("GET", format!("/v4/domains/{name}"), "domain"))
    }

    async fn update_domain(&self, name: &str, params: &DomainParameters) -> ApiResult<()> {
        let mut state = self.begin("update_domain")?;
        let domain = state
            .domains
            .get_mut(name)
            .ok_or_else(|| not_found("PUT", format!("/v4/domains/{name}"), "domain"))?;
        if params.spam_action.is_some() {
            domain.spam_action = params.spam_action;
        }
        if let Some(wildcard) = params.wildcard {
            domain.wildcard = wildcard;
        }
        if params.web_scheme.is_some() {
            domain.web_scheme = params.web_scheme;
        }
        Ok(())
    }

    async fn delete_domain(&self, name: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_domain")?;
        state
            .domains
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("DELETE", format!("/v3/domains/{name}"), "domain"))
    }

    async fn create_route(&self, params: &RouteParameters) -> ApiResult<RouteObservation> {
        params.validate()?;
        let mut state = self.begin("create_route")?;
        state.next_id += 1;
        let observed = RouteObservation {
            id: format!("{:024x}", state.next_id),
            priority: params.priority,
            description: params.description.clone(),
            expression: params.expression.clone(),
            actions: params.actions.clone(),
            created_at: None,
        };
        state.routes.insert(observed.id.clone(), observed.clone());
        Ok(observed)
    }

    async fn get_route(&self, id: &str) -> ApiResult<RouteObservation> {
        let state = self.begin("get_route")?;
        state
            .routes
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("GET", format!("/v3/routes/{id}"), "route"))
    }

    async fn update_route(&self, id: &str, params: &RouteParameters) -> ApiResult<RouteObservation> {
        let mut state = self.begin("update_route")?;
        let route = state
            .routes
            .get_mut(id)
            .ok_or_else(|| not_found("PUT", format!("/v3/routes/{id}"), "route"))?;
        route.priority = params.priority;
        route.description = params.description.clone();
        route.expression = params.expression.clone();
        route.actions = params.actions.clone();
        Ok(route.clone())
    }

    async fn delete_route(&self, id: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_route")?;
        state
            .routes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("DELETE", format!("/v3/routes/{id}"), "route"))
    }

    async fn create_mailing_list(
        &self,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation> {
        params.validate()?;
        let mut state = self.begin("create_mailing_list")?;
        if state.lists.contains_key(&params.address) {
            return Err(already_exists("/v3/lists".into(), "mailing list"));
        }
        let observed = list_from(params, 0);
        state.lists.insert(params.address.clone(), observed.clone());
        Ok(observed)
    }

    async fn get_mailing_list(&self, address: &str) -> ApiResult<MailingListObservation> {
        let state = self.begin("get_mailing_list")?;
        state
            .lists
            .get(address)
            .cloned()
            .ok_or_else(|| not_found("GET", format!("/v3/lists/{address}"), "mailing list"))
    }

    async fn update_mailing_list(
        &self,
        address: &str,
        params: &MailingListParameters,
    ) -> ApiResult<MailingListObservation> {
        let mut state = self.begin("update_mailing_list")?;
        let existing = state
            .lists
            .remove(address)
            .ok_or_else(|| not_found("PUT", format!("/v3/lists/{address}"), "mailing list"))?;
        let observed = list_from(params, existing.members_count);
        state.lists.insert(observed.address.clone(), observed.clone());
        Ok(observed)
    }

    async fn delete_mailing_list(&self, address: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_mailing_list")?;
        state
            .lists
            .remove(address)
            .map(|_| ())
            .ok_or_else(|| not_found("DELETE", format!("/v3/lists/{address}"), "mailing list"))
    }

    async fn create_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation> {
        params.validate()?;
        let mut state = self.begin("create_webhook")?;
        let id = (params.domain.clone(), params.kind);
        if state.webhooks.contains_key(&id) {
            return Err(already_exists(format!("/v3/domains/{}/webhooks", params.domain), "webhook"));
        }
        let observed = webhook_from(params);
        state.webhooks.insert(id, observed.clone());
        Ok(observed)
    }

    async fn get_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<WebhookObservation> {
        let state = self.begin("get_webhook")?;
        state.webhooks.get(&(domain.to_owned(), kind)).cloned().ok_or_else(|| {
            not_found("GET", format!("/v3/domains/{domain}/webhooks/{kind}"), "webhook")
        })
    }

    async fn update_webhook(&self, params: &WebhookParameters) -> ApiResult<WebhookObservation> {
        let mut state = self.begin("update_webhook")?;
        let path = format!("/v3/domains/{}/webhooks/{}", params.domain, params.kind);
        let webhook = state
            .webhooks
            .get_mut(&(params.domain.clone(), params.kind))
            .ok_or_else(|| not_found("PUT", path, "webhook"))?;
        webhook.urls = params.urls.clone();
        Ok(webhook.clone())
    }

    async fn delete_webhook(&self, domain: &str, kind: WebhookKind) -> ApiResult<()> {
        let mut state = self.begin("delete_webhook")?;
        state.webhooks.remove(&(domain.to_owned(), kind)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/domains/{domain}/webhooks/{kind}"), "webhook")
        })
    }

    async fn create_smtp_credential(&self, params: &SmtpCredentialParameters) -> ApiResult<()> {
        params.validate()?;
        let mut state = self.begin("create_smtp_credential")?;
        let id = key(&params.domain, &params.full_login());
        if state.credentials.contains_key(&id) {
            return Err(already_exists(
                format!("/v3/domains/{}/credentials", params.domain),
                "credential",
            ));
        }
        let observed = SmtpCredentialObservation {
            login: params.full_login(),
            mailbox: Some(params.full_login()),
            ..SmtpCredentialObservation::default()
        };
        state.credentials.insert(id, (observed, params.password.clone()));
        Ok(())
    }

    async fn get_smtp_credential(
        &self,
        domain: &str,
        login: &str,
    ) -> ApiResult<SmtpCredentialObservation> {
        let state = self.begin("get_smtp_credential")?;
        let full = qualify_login(login, domain);
        state.credentials.get(&key(domain, &full)).map(|(o, _)| o.clone()).ok_or_else(|| {
            not_found("GET", format!("/v3/domains/{domain}/credentials"), "credential")
        })
    }

    async fn update_smtp_credential_password(
        &self,
        params: &SmtpCredentialParameters,
    ) -> ApiResult<()> {
        let mut state = self.begin("update_smtp_credential_password")?;
        let path = format!("/v3/domains/{}/credentials/{}", params.domain, params.login);
        let (_, password) = state
            .credentials
            .get_mut(&key(&params.domain, &params.full_login()))
            .ok_or_else(|| not_found("PUT", path, "credential"))?;
        password.clone_from(&params.password);
        Ok(())
    }

    async fn delete_smtp_credential(&self, domain: &str, login: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_smtp_credential")?;
        let full = qualify_login(login, domain);
        state.credentials.remove(&key(domain, &full)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/domains/{domain}/credentials/{login}"), "credential")
        })
    }

    async fn create_template(&self, params: &TemplateParameters) -> ApiResult<TemplateObservation> {
        params.validate()?;
        let mut state = self.begin("create_template")?;
        let id = key(&params.domain, &params.name);
        if state.templates.contains_key(&id) {
            return Err(already_exists(format!("/v3/{}/templates", params.domain), "template"));
        }
        state.next_id += 1;
        let observed = TemplateObservation {
            id: format!("tmpl-{}", state.next_id),
            name: params.name.clone(),
            description: params.description.clone().unwrap_or_default(),
            created_at: None,
            created_by: None,
            version: Some(TemplateVersion {
                tag: params.tag.clone().unwrap_or_else(|| "initial".into()),
                template: params.template.clone(),
                engine: params.engine.clone().unwrap_or_else(|| "handlebars".into()),
                comment: params.comment.clone().unwrap_or_default(),
                active: true,
                created_at: None,
            }),
        };
        state.templates.insert(id, observed.clone());
        Ok(observed)
    }

    async fn get_template(&self, domain: &str, name: &str) -> ApiResult<TemplateObservation> {
        let state = self.begin("get_template")?;
        state
            .templates
            .get(&key(domain, name))
            .cloned()
            .ok_or_else(|| not_found("GET", format!("/v3/{domain}/templates/{name}"), "template"))
    }

    async fn update_template(&self, params: &TemplateParameters) -> ApiResult<()> {
        let mut state = self.begin("update_template")?;
        let path = format!("/v3/{}/templates/{}", params.domain, params.name);
        let template = state
            .templates
            .get_mut(&key(&params.domain, &params.name))
            .ok_or_else(|| not_found("PUT", path, "template"))?;
        template.description = params.description.clone().unwrap_or_default();
        Ok(())
    }

    async fn delete_template(&self, domain: &str, name: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_template")?;
        state.templates.remove(&key(domain, name)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/{domain}/templates/{name}"), "template")
        })
    }

    async fn create_bounce(&self, params: &BounceParameters) -> ApiResult<()> {
        params.validate()?;
        let mut state = self.begin("create_bounce")?;
        let observed = BounceObservation {
            address: params.address.clone(),
            code: Some(params.code.unwrap_or(550).to_string()),
            error: params.error.clone(),
            created_at: None,
        };
        state.bounces.insert(key(&params.domain, &params.address), observed);
        Ok(())
    }

    async fn get_bounce(&self, domain: &str, address: &str) -> ApiResult<BounceObservation> {
        let state = self.begin("get_bounce")?;
        state
            .bounces
            .get(&key(domain, address))
            .cloned()
            .ok_or_else(|| not_found("GET", format!("/v3/{domain}/bounces/{address}"), "address"))
    }

    async fn delete_bounce(&self, domain: &str, address: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_bounce")?;
        state.bounces.remove(&key(domain, address)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/{domain}/bounces/{address}"), "address")
        })
    }

    async fn create_complaint(&self, params: &ComplaintParameters) -> ApiResult<()> {
        params.validate()?;
        let mut state = self.begin("create_complaint")?;
        let observed = ComplaintObservation { address: params.address.clone(), created_at: None };
        state.complaints.insert(key(&params.domain, &params.address), observed);
        Ok(())
    }

    async fn get_complaint(&self, domain: &str, address: &str) -> ApiResult<ComplaintObservation> {
        let state = self.begin("get_complaint")?;
        state.complaints.get(&key(domain, address)).cloned().ok_or_else(|| {
            not_found("GET", format!("/v3/{domain}/complaints/{address}"), "address")
        })
    }

    async fn delete_complaint(&self, domain: &str, address: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_complaint")?;
        state.complaints.remove(&key(domain, address)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/{domain}/complaints/{address}"), "address")
        })
    }

    async fn create_unsubscribe(&self, params: &UnsubscribeParameters) -> ApiResult<()> {
        params.validate()?;
        let mut state = self.begin("create_unsubscribe")?;
        let observed = UnsubscribeObservation {
            address: params.address.clone(),
            tags: params.effective_tags(),
            created_at: None,
        };
        state.unsubscribes.insert(key(&params.domain, &params.address), observed);
        Ok(())
    }

    async fn get_unsubscribe(&self, domain: &str, address: &str) -> ApiResult<UnsubscribeObservation> {
        let state = self.begin("get_unsubscribe")?;
        state.unsubscribes.get(&key(domain, address)).cloned().ok_or_else(|| {
            not_found("GET", format!("/v3/{domain}/unsubscribes/{address}"), "address")
        })
    }

    async fn delete_unsubscribe(&self, domain: &str, address: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_unsubscribe")?;
        state.unsubscribes.remove(&key(domain, address)).map(|_| ()).ok_or_else(|| {
            not_found("DELETE", format!("/v3/{domain}/unsubscribes/{address}"), "address")
        })
    }
}

fn list_from(params: &MailingListParameters, members_count: u64) -> MailingListObservation {
    MailingListObservation {
        address: params.address.clone(),
        name: params.name.clone().unwrap_or_default(),
        description: params.description.clone().unwrap_or_default(),
        access_level: params.access_level,
        reply_preference: params.reply_preference,
        members_count,
        created_at: None,
    }
}

fn webhook_from(params: &WebhookParameters) -> WebhookObservation {
    WebhookObservation { domain: params.domain.clone(), kind: params.kind, urls: params.urls.clone() }
}
