//! Minimal HTML shells around the diagram and the gate forms.

use crate::hud::escape_xml;

const STYLE: &str = "body{margin:0;background:#070d0b;color:#d8f3e8;font-family:ui-monospace,Menlo,monospace}\
main{max-width:960px;margin:0 auto;padding:24px}\
.hud{aspect-ratio:1/1;width:100%;max-width:800px}\
@media (max-width:640px){main{padding:12px}h1{font-size:20px}}\
form{display:grid;gap:8px;margin:16px 0;max-width:420px}\
input,textarea,button{font:inherit;padding:6px;background:#0d1714;color:inherit;border:1px solid #2d5f52}\
.err{color:#f27b6e;min-height:1em}";

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body><main>{body}</main></body></html>",
        escape_xml(title)
    )
}

/// Re-fetches the live frame into `#hud`, one request in flight at a time.
const HUD_SCRIPT: &str = r#"
(function () {
  const hud = document.getElementById("hud");
  const every = Number(hud.dataset.refreshMs) || 50;
  async function tick() {
    try {
      const res = await fetch("/hud.svg", {cache: "no-store"});
      if (res.ok) { hud.innerHTML = await res.text(); }
    } catch (_) {}
    setTimeout(tick, every);
  }
  setTimeout(tick, every);
})();
"#;

/// `hud_svg` is the first frame; the page script keeps it live every `refresh_ms`.
pub fn landing(hud_svg: &str, active_label: &str, refresh_ms: u64) -> String {
    let body = format!(
        "<h1>Statbase</h1>\
         <p>Tracking, models and play-level telemetry for clubs and scouting departments.</p>\
         <div class=\"hud\" id=\"hud\" role=\"img\" aria-label=\"{}\" \
         data-refresh-ms=\"{refresh_ms}\">{hud_svg}</div>\
         <p><a href=\"/gate\">Request demo access</a> · <a href=\"/privacy\">Privacy</a></p>\
         <script>{HUD_SCRIPT}</script>",
        escape_xml(active_label)
    );
    shell("Statbase", &body)
}

const GATE_SCRIPT: &str = r#"
async function post(url, form, extra) {
  const payload = Object.assign(Object.fromEntries(new FormData(form).entries()), extra || {});
  const res = await fetch(url, {method: "POST", headers: {"Content-Type": "application/json"}, body: JSON.stringify(payload)});
  return res;
}
document.getElementById("unlock").addEventListener("submit", async (e) => {
  e.preventDefault();
  const err = document.getElementById("err");
  err.textContent = "";
  try {
    const res = await post("/api/demo/unlock", e.currentTarget);
    if (res.ok) { window.location.href = (await res.json()).next; } else { err.textContent = await res.text(); }
  } catch { err.textContent = "Network error. Please try again."; }
});
document.getElementById("lead").addEventListener("submit", async (e) => {
  e.preventDefault();
  const err = document.getElementById("err");
  err.textContent = "";
  const form = e.currentTarget;
  if (!form.consent.checked) { err.textContent = "Please agree to data processing to continue."; return; }
  try {
    const res = await post("/api/demo/lead", form, {consent: true});
    if (res.ok) { form.reset(); err.textContent = "Thanks! We'll review and approve you shortly."; } else { err.textContent = await res.text(); }
  } catch { err.textContent = "Network error. Please try again."; }
});
"#;

pub fn gate() -> String {
    let body = format!(
        "<h1>Statbase demo</h1>\
         <p class=\"err\" id=\"err\" role=\"alert\"></p>\
         <h2>Unlock</h2>\
         <form id=\"unlock\">\
         <input name=\"email\" type=\"email\" placeholder=\"you@club.com\" required>\
         <input name=\"password\" type=\"password\" placeholder=\"Access code\" required>\
         <button type=\"submit\">Unlock</button></form>\
         <h2>Request access</h2>\
         <form id=\"lead\">\
         <input name=\"name\" placeholder=\"Name\">\
         <input name=\"email\" type=\"email\" placeholder=\"Work email\" required>\
         <input name=\"org\" placeholder=\"Organisation\">\
         <input name=\"role\" placeholder=\"Role\">\
         <textarea name=\"note\" placeholder=\"What would you like to see?\"></textarea>\
         <label><input name=\"consent\" type=\"checkbox\"> I agree to the processing of my data \
         as described in the <a href=\"/privacy\">privacy notice</a>.</label>\
         <button type=\"submit\">Request access</button></form>\
         <script>{GATE_SCRIPT}</script>"
    );
    shell("Statbase · Demo access", &body)
}

pub fn privacy() -> String {
    let body = "<h1>Privacy</h1>\
        <p>When you request demo access we store the name, email, organisation, role and note \
        you submit, together with the time of consent, the requesting IP address and your \
        browser's user-agent string. This is used only to review and grant access.</p>\
        <p>Unlock attempts check your email or its domain against our approval list; \
        passwords are not stored.</p>\
        <p>To have your data removed, contact privacy@statbase.eu.</p>";
    shell("Statbase · Privacy", body)
}
