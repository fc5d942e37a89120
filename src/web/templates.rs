//! # Maud-Skabeloner — Chatskallen
//!
//! Server-renderet HTML med **Maud**. Skallen er bevidst enkel: et
//! chatvindue, et inputfelt og en statuslinje. HTMX sørger for at
//! POST `/chat` injiceres i beskedlisten uden sideskift, og SSE-feeden
//! viser trænings- og indlæringshændelser.

use maud::{html, Markup, DOCTYPE};

/// Hele chatsiden: layout, beskedliste, inputform og scripts.
pub fn full_page() -> Markup {
    html! {
        (DOCTYPE)
        html lang="da" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Jarvis" }
                script src="https://unpkg.com/htmx.org@2.0.4" {}
                style { (STYLES) }
            }
            body {
                main class="chat-shell" {
                    header {
                        h1 { "Jarvis" }
                        span id="model-status" class="status loading" { "Modellen trænes…" }
                    }
                    div id="chat-messages" {
                        div class="message system-message" {
                            div class="message-role" { "Jarvis" }
                            div class="message-content" {
                                "Hej! Spørg mig om tiden, vejret, en joke — eller lær mig noget nyt."
                            }
                        }
                    }
                    form hx-post="/chat" hx-target="#chat-messages" hx-swap="beforeend"
                         hx-on--after-request="this.reset()" {
                        input type="text" name="message" placeholder="Skriv en besked…"
                              autocomplete="off" autofocus;
                        button type="submit" { "Send" }
                    }
                    div id="event-feed" {}
                }
                script { (maud::PreEscaped(STATUS_POLL_JS)) }
            }
        }
    }
}

/// Brugerens besked som HTMX-fragment.
pub fn user_message(text: &str) -> Markup {
    html! {
        div class="message user-message" {
            div class="message-role" { "Dig" }
            div class="message-content" { (text) }
        }
    }
}

/// Systemets svar som HTMX-fragment, med intent og konfidens som
/// diskret metadatalinje.
pub fn system_message(reply: &str, intent: &str, confidence: Option<f64>) -> Markup {
    html! {
        div class="message system-message" {
            div class="message-role" { "Jarvis" }
            div class="message-content" { (reply) }
            div class="message-meta" {
                @match confidence {
                    Some(c) => { (format!("{intent} · {c:.2}")) }
                    None => { (intent) }
                }
            }
        }
    }
}

/// Ventebesked mens den første træning kører.
pub fn loading_message(user_text: &str) -> Markup {
    html! {
        (user_message(user_text))
        div class="message system-message loading" {
            div class="message-role" { "Jarvis" }
            div class="message-content" { "Modellen trænes stadig — prøv igen om lidt." }
        }
    }
}

/// Bekræftelse på nulstillet samtale.
pub fn reset_message() -> Markup {
    html! {
        div class="message system-message" {
            div class="message-role" { "Jarvis" }
            div class="message-content" { "Samtalen er nulstillet. Hvad kan jeg hjælpe med?" }
        }
    }
}

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #111; color: #eee; }
.chat-shell { max-width: 720px; margin: 0 auto; padding: 1rem; display: flex;
              flex-direction: column; height: 100vh; box-sizing: border-box; }
header { display: flex; justify-content: space-between; align-items: baseline; }
h1 { font-size: 1.2rem; margin: 0.5rem 0; }
.status { font-size: 0.8rem; color: #7c7; }
.status.loading { color: #cc7; }
#chat-messages { flex: 1; overflow-y: auto; display: flex; flex-direction: column;
                 gap: 0.5rem; padding: 0.5rem 0; }
.message { padding: 0.5rem 0.75rem; border-radius: 8px; max-width: 85%; }
.user-message { align-self: flex-end; background: #2b4a6f; }
.system-message { align-self: flex-start; background: #222; }
.message-role { font-size: 0.7rem; color: #999; margin-bottom: 0.2rem; }
.message-meta { font-size: 0.65rem; color: #777; margin-top: 0.3rem; }
form { display: flex; gap: 0.5rem; padding: 0.5rem 0; }
input[type=text] { flex: 1; padding: 0.5rem; border-radius: 6px; border: 1px solid #444;
                   background: #1a1a1a; color: #eee; }
button { padding: 0.5rem 1rem; border-radius: 6px; border: none; background: #2b4a6f;
         color: #eee; cursor: pointer; }
#event-feed { font-size: 0.7rem; color: #888; max-height: 4rem; overflow-y: auto; }
"#;

const STATUS_POLL_JS: &str = r#"
(function () {
  var status = document.getElementById('model-status');
  function poll() {
    fetch('/status').then(function (r) { return r.json(); }).then(function (s) {
      if (s.ready) {
        status.textContent = 'Klar';
        status.classList.remove('loading');
      } else {
        setTimeout(poll, 3000);
      }
    }).catch(function () { setTimeout(poll, 3000); });
  }
  poll();

  var feed = document.getElementById('event-feed');
  var es = new EventSource('/events');
  es.onmessage = function (e) {
    var ev = JSON.parse(e.data);
    var line = document.createElement('div');
    if (ev.type === 'TrainingStarted') { line.textContent = 'Gentræning startet (' + ev.trigger + ')'; }
    else if (ev.type === 'TrainingFinished') { line.textContent = 'Gentræning færdig: ' + ev.examples + ' eksempler, ' + ev.labels + ' intents.'; }
    else if (ev.type === 'TrainingFailed') { line.textContent = 'Gentræning fejlede: ' + ev.message; }
    else if (ev.type === 'ExampleConfirmed') { line.textContent = 'Lærte: "' + ev.utterance + '" -> ' + ev.intent; }
    else { return; }
    feed.appendChild(line);
    feed.scrollTop = feed.scrollHeight;
  };
})();
"#;
