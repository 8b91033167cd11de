//! Servicio HealthConnect falso con estado, para tests sin red.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use probe_core::transport::{InMemoryPushBroker, InMemoryService};
use probe_core::{ProbeError, ServiceRequest, ServiceResponse, Verb};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    /// Acepta reservas solapadas con 201.
    pub overlap_bug: bool,
    /// Publica los mensajes de chat en `/topic/chat/{id}`.
    pub deliver_push: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self { overlap_bug: false,
               deliver_push: true }
    }
}

#[derive(Debug, Clone)]
struct User {
    id: u64,
    email: String,
    password: String,
    role: String,
    full_name: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    users: Vec<User>,
    tokens: HashMap<String, u64>,
    appointments: Vec<Value>,
    chats: Vec<Value>,
    messages: Vec<Value>,
}

impl State {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

fn user_json(u: &User) -> Value {
    json!({"id": u.id, "email": u.email, "fullName": u.full_name, "role": u.role})
}

fn error(status: u16, msg: &str) -> Result<ServiceResponse, ProbeError> {
    Ok(ServiceResponse::new(status, json!({"error": msg, "timestamp": "2030-01-01T00:00:00"})))
}

type Shared = Arc<Mutex<State>>;

fn authed(state: &Shared, req: &ServiceRequest) -> Option<u64> {
    let token = req.bearer()?;
    state.lock().unwrap().tokens.get(token).copied()
}

pub struct FakeHealthConnect {
    pub service: Arc<InMemoryService>,
    pub broker: InMemoryPushBroker,
    state: Shared,
}

impl FakeHealthConnect {
    pub fn new() -> Self {
        Self::start(Behavior::default())
    }

    pub fn start(behavior: Behavior) -> Self {
        let service = Arc::new(InMemoryService::new());
        let broker = InMemoryPushBroker::new();
        let state: Shared = Arc::new(Mutex::new(State::default()));

        service.respond(Verb::Get, "/api/health", 200, json!({"status": "UP"}));

        let s = state.clone();
        service.route(Verb::Post, "/api/auth/register", move |req| {
                   let body = req.body.clone().unwrap_or_default();
                   let email = body["email"].as_str().unwrap_or_default().to_string();
                   let mut st = s.lock().unwrap();
                   if email.is_empty() || st.users.iter().any(|u| u.email == email) {
                       return error(400, "Email already exists");
                   }
                   let id = st.next();
                   let user = User { id,
                                     email,
                                     password: body["password"].as_str().unwrap_or_default().to_string(),
                                     role: body["role"].as_str().unwrap_or("PATIENT").to_string(),
                                     full_name: body["fullName"].as_str().unwrap_or_default().to_string() };
                   let out = user_json(&user);
                   st.users.push(user);
                   Ok(ServiceResponse::new(200, out))
               });

        let s = state.clone();
        service.route(Verb::Post, "/api/auth/login", move |req| {
                   let body = req.body.clone().unwrap_or_default();
                   let mut st = s.lock().unwrap();
                   let found = st.users
                                 .iter()
                                 .find(|u| body["email"] == u.email.as_str() && body["password"] == u.password.as_str())
                                 .cloned();
                   match found {
                       Some(user) => {
                           let token = format!("jwt-{}-{}", user.id, st.tokens.len());
                           st.tokens.insert(token.clone(), user.id);
                           let mut out = user_json(&user);
                           out["token"] = json!(token);
                           Ok(ServiceResponse::new(200, out))
                       }
                       None => error(401, "Invalid email or password"),
                   }
               });

        let s = state.clone();
        service.route(Verb::Get, "/api/users/me", move |req| {
                   let Some(uid) = authed(&s, req) else { return error(401, "Unauthorized") };
                   let st = s.lock().unwrap();
                   Ok(ServiceResponse::new(200, st.user(uid).map(user_json).unwrap_or_default()))
               });

        let s = state.clone();
        service.route(Verb::Post, "/api/appointments", move |req| {
                   let Some(uid) = authed(&s, req) else { return error(401, "Unauthorized") };
                   let body = req.body.clone().unwrap_or_default();
                   let mut st = s.lock().unwrap();
                   let (start, end) = (body["startTime"].as_str().unwrap_or_default().to_string(),
                                       body["endTime"].as_str().unwrap_or_default().to_string());
                   let overlaps = st.appointments.iter().any(|a| {
                                                           a["doctorId"] == body["doctorId"]
                                                           && a["date"] == body["date"]
                                                           && a["startTime"].as_str().unwrap_or_default() < end.as_str()
                                                           && start.as_str() < a["endTime"].as_str().unwrap_or_default()
                                                       });
                   if overlaps && !behavior.overlap_bug {
                       return error(400, "Doctor is not available at the requested time");
                   }
                   let id = st.next();
                   let appt = json!({
                       "id": id,
                       "doctorId": body["doctorId"],
                       "patientId": uid,
                       "date": body["date"],
                       "startTime": start,
                       "endTime": end,
                       "type": body["type"],
                       "status": "SCHEDULED",
                   });
                   st.appointments.push(appt.clone());
                   Ok(ServiceResponse::new(201, appt))
               });

        let s = state.clone();
        service.route(Verb::Get, "/api/appointments", move |req| {
                   let Some(uid) = authed(&s, req) else { return error(401, "Unauthorized") };
                   let st = s.lock().unwrap();
                   let mine: Vec<Value> = st.appointments
                                            .iter()
                                            .filter(|a| a["patientId"] == uid || a["doctorId"] == uid)
                                            .cloned()
                                            .collect();
                   Ok(ServiceResponse::new(200, Value::Array(mine)))
               });

        let s = state.clone();
        service.route(Verb::Post, "/api/chats", move |req| {
                   let Some(uid) = authed(&s, req) else { return error(401, "Unauthorized") };
                   let body = req.body.clone().unwrap_or_default();
                   let mut st = s.lock().unwrap();
                   let id = st.next();
                   let chat = json!({"id": id, "participants": [uid, body["participantId"]]});
                   st.chats.push(chat.clone());
                   Ok(ServiceResponse::new(200, chat))
               });

        let s = state.clone();
        let b = broker.clone();
        service.route(Verb::Post, "/api/chats/*/messages", move |req| {
                   let Some(uid) = authed(&s, req) else { return error(401, "Unauthorized") };
                   let chat_id: u64 = req.path_segments()[2].parse().unwrap_or_default();
                   let body = req.body.clone().unwrap_or_default();
                   let message = {
                       let mut st = s.lock().unwrap();
                       if !st.chats.iter().any(|c| c["id"] == chat_id) {
                           return error(404, "Chat not found");
                       }
                       let id = st.next();
                       let m = json!({"id": id, "chatId": chat_id, "senderId": uid, "content": body["content"]});
                       st.messages.push(m.clone());
                       m
                   };
                   if behavior.deliver_push {
                       b.publish(&format!("/topic/chat/{chat_id}"), message.clone());
                   }
                   Ok(ServiceResponse::new(200, message))
               });

        let s = state.clone();
        service.route(Verb::Get, "/api/chats/*/messages", move |req| {
                   if authed(&s, req).is_none() {
                       return error(401, "Unauthorized");
                   }
                   let chat_id: u64 = req.path_segments()[2].parse().unwrap_or_default();
                   let st = s.lock().unwrap();
                   let list: Vec<Value> = st.messages.iter().filter(|m| m["chatId"] == chat_id).cloned().collect();
                   Ok(ServiceResponse::new(200, Value::Array(list)))
               });

        Self { service,
               broker,
               state }
    }

    /// Cuenta existente antes de la ejecución (fixture de larga vida).
    pub fn seed_user(&self, email: &str, password: &str, role: &str) -> u64 {
        let mut st = self.state.lock().unwrap();
        let id = st.next();
        st.users.push(User { id,
                             email: email.into(),
                             password: password.into(),
                             role: role.into(),
                             full_name: "Fixture".into() });
        id
    }

    pub fn appointment_count(&self) -> usize {
        self.state.lock().unwrap().appointments.len()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }
}
