pub(super) const DASHBOARD_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Mock Ticketing Dashboard</title>
<style>
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;margin:20px}
.card{border:1px solid #ddd;padding:15px;margin:10px 0;border-radius:5px}
button{background:#007cba;color:#fff;padding:8px 16px;border:none;border-radius:3px;cursor:pointer;margin:5px}
button:hover{background:#005a87}
pre{background:#f8f9fa;padding:10px;border-radius:3px;overflow-x:auto}
.ticket{border-left:3px solid #007cba;padding-left:10px;margin:5px 0}
</style>
</head>
<body>
<h1>Mock Ticketing Dashboard</h1>

<div class="card">
<h3>Current Status</h3>
<p><strong>Tickets Created:</strong> <span id="ticket-count">-</span></p>
<p><strong>Settings:</strong></p>
<pre id="settings">-</pre>
<button onclick="refresh()">Refresh</button>
<button onclick="clearTickets()">Clear Tickets</button>
</div>

<div class="card">
<h3>Test Scenarios</h3>
<button onclick="setScenario('reset')">Normal Operation</button>
<button onclick="setScenario('service-down')">Service Down</button>
<button onclick="setScenario('service-auth-fail')">Auth Failure</button>
<button onclick="setScenario('service-slow')">Slow Response</button>
<button onclick="setScenario('service-intermittent')">Intermittent Failures</button>
</div>

<div class="card">
<h3>Recent Tickets</h3>
<div id="tickets"></div>
</div>

<script>
async function refresh() {
  try {
    const [ticketsRes, settingsRes] = await Promise.all([
      fetch('/api/test/tickets'),
      fetch('/api/test/settings'),
    ]);
    const tickets = await ticketsRes.json();
    const settings = await settingsRes.json();

    document.getElementById('ticket-count').textContent = tickets.count;
    document.getElementById('settings').textContent = JSON.stringify(settings, null, 2);

    const list = document.getElementById('tickets');
    list.replaceChildren();
    for (const ticket of tickets.tickets.slice(-5).reverse()) {
      const entry = document.createElement('div');
      entry.className = 'ticket';
      const number = document.createElement('strong');
      number.textContent = ticket.number;
      const description = document.createTextNode(' - ' + (ticket.short_description ?? ''));
      const created = document.createElement('small');
      created.textContent = 'Created: ' + new Date(ticket.created_on).toLocaleString();
      entry.append(number, description, document.createElement('br'), created);
      list.append(entry);
    }
  } catch (error) {
    alert('Error refreshing status: ' + error.message);
  }
}

async function clearTickets() {
  try {
    await fetch('/api/test/tickets', { method: 'DELETE' });
    await refresh();
  } catch (error) {
    alert('Error clearing tickets: ' + error.message);
  }
}

async function setScenario(scenario) {
  try {
    const res = await fetch('/api/test/scenario/' + scenario, { method: 'POST' });
    const result = await res.json();
    alert(result.message ?? result.error);
    await refresh();
  } catch (error) {
    alert('Error setting scenario: ' + error.message);
  }
}

refresh();
</script>
</body>
</html>
"##;
