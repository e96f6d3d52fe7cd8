//! Embedded HTML templates for the psdash web UI.
//!
//! All templates are `&str` constants rendered via minijinja. Styling is
//! inline so the binary serves the whole UI without static assets.

/// Base layout template. All pages extend this.
pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{% block title %}Dashboard{% endblock %} - Proxy Service</title>
    <style>
        :root {
            --paper: #f6f7f9;
            --panel: #ffffff;
            --rule: #d9dde3;
            --ink: #1f2933;
            --ink-soft: #52606d;
            --brand: #0b6e4f;
            --brand-dark: #08533b;
            --alert: #b42318;
            --alert-bg: #fdecea;
            --corner: 4px;
        }
        * { box-sizing: border-box; }
        body {
            margin: 0;
            font: 15px/1.5 system-ui, -apple-system, "Helvetica Neue", Arial, sans-serif;
            background: var(--paper);
            color: var(--ink);
        }
        a { color: var(--brand); }
        header.top {
            background: var(--brand);
            color: #fff;
            display: flex;
            align-items: center;
            gap: 1.5rem;
            padding: 0.6rem 1.25rem;
        }
        header.top .brand { font-weight: 700; color: #fff; text-decoration: none; }
        header.top nav { display: flex; flex-wrap: wrap; gap: 0.9rem; flex: 1; }
        header.top nav a { color: #d8f3e8; text-decoration: none; font-size: 0.9rem; }
        header.top nav a:hover { color: #fff; text-decoration: underline; }
        header.top .who { font-size: 0.85rem; color: #d8f3e8; }
        header.top .who a { color: #fff; margin-left: 0.5rem; }
        main { max-width: 1100px; margin: 1.5rem auto; padding: 0 1.25rem; }
        h1 { font-size: 1.4rem; margin: 0 0 1rem; }
        .panel {
            background: var(--panel);
            border: 1px solid var(--rule);
            border-radius: var(--corner);
            padding: 1.25rem;
        }
        table.grid { width: 100%; border-collapse: collapse; background: var(--panel); }
        table.grid th, table.grid td {
            text-align: left;
            padding: 0.45rem 0.6rem;
            border-bottom: 1px solid var(--rule);
        }
        table.grid th { font-size: 0.8rem; text-transform: uppercase; color: var(--ink-soft); }
        table.grid tr:hover td { background: #eef6f2; }
        .toolbar { display: flex; justify-content: space-between; align-items: center; margin-bottom: 0.75rem; }
        .pager { display: flex; gap: 1rem; margin-top: 0.75rem; font-size: 0.9rem; }
        .button, button {
            display: inline-block;
            border: 1px solid var(--brand);
            background: var(--brand);
            color: #fff;
            padding: 0.35rem 0.9rem;
            border-radius: var(--corner);
            font: inherit;
            cursor: pointer;
            text-decoration: none;
        }
        .button:hover, button:hover { background: var(--brand-dark); }
        button.danger { background: var(--alert); border-color: var(--alert); }
        .field { margin-bottom: 0.9rem; }
        .field label { display: block; font-weight: 600; margin-bottom: 0.2rem; }
        .field input[type=text], .field input[type=password], .field select {
            width: 100%;
            padding: 0.4rem 0.5rem;
            border: 1px solid var(--rule);
            border-radius: var(--corner);
            font: inherit;
        }
        .field select[multiple] { min-height: 7rem; }
        .field .hint { font-size: 0.8rem; color: var(--ink-soft); }
        .field ul.errors { margin: 0.25rem 0 0; padding: 0; list-style: none; color: var(--alert); font-size: 0.85rem; }
        .flash { background: var(--alert-bg); color: var(--alert); padding: 0.6rem 0.8rem; border-radius: var(--corner); margin-bottom: 1rem; }
        .actions { display: flex; gap: 0.75rem; align-items: center; }
        .muted { color: var(--ink-soft); }
    </style>
</head>
<body>
    <header class="top">
        <a class="brand" href="/dashboard">Proxy Service</a>
        {% if user %}
        <nav>
            {% for item in nav %}<a href="{{ item.href }}">{{ item.label }}</a>{% endfor %}
        </nav>
        <span class="who">{{ user.name }}<a href="/logout">Log out</a></span>
        {% endif %}
    </header>
    <main>
        {% block content %}{% endblock %}
    </main>
</body>
</html>
"#;

/// Login page.
pub const LOGIN: &str = r#"{% extends "layout" %}
{% block title %}Log in{% endblock %}
{% block content %}
<div class="panel" style="max-width: 380px; margin: 3rem auto;">
    <h1>Log in</h1>
    {% if message %}<div class="flash">{{ message }}</div>{% endif %}
    <form method="post" action="/login{% if next %}?next={{ next|urlencode }}{% endif %}" id="login-form">
        <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
        <div class="field">
            <label for="username">Username</label>
            <input type="text" id="username" name="username" value="{{ username }}" autofocus>
            {% if errors.username %}<ul class="errors"><li>{{ errors.username }}</li></ul>{% endif %}
        </div>
        <div class="field">
            <label for="password">Password</label>
            <input type="password" id="password" name="password">
            {% if errors.password %}<ul class="errors"><li>{{ errors.password }}</li></ul>{% endif %}
        </div>
        <button type="submit">Log in</button>
    </form>
</div>
{% endblock %}
"#;

/// Landing page after login.
pub const DASHBOARD: &str = r#"{% extends "layout" %}
{% block title %}Dashboard{% endblock %}
{% block content %}
<h1>Dashboard</h1>
<p class="muted">Signed in as {{ user.username }}.</p>
<table class="grid" id="entity-table">
    <thead><tr><th>Collection</th><th></th></tr></thead>
    <tbody>
    {% for item in nav %}
        <tr>
            <td><a href="{{ item.href }}">{{ item.label }}</a></td>
            <td><a href="{{ item.new_href }}">New {{ item.singular }}</a></td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% endblock %}
"#;

/// Paginated list of one entity.
pub const ENTITY_LIST: &str = r#"{% extends "layout" %}
{% block title %}{{ entity.plural }}{% endblock %}
{% block content %}
<div class="toolbar">
    <h1>{{ entity.plural }}</h1>
    <a class="button" href="{{ entity.edit_path }}">New {{ entity.singular }}</a>
</div>
<table class="grid" id="records">
    <thead>
        <tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}<th></th></tr>
    </thead>
    <tbody>
    {% for row in rows %}
        <tr>
            {% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}
            <td>{% if row.edit_url %}<a href="{{ row.edit_url }}">Edit</a>{% endif %}</td>
        </tr>
    {% else %}
        <tr><td colspan="{{ columns|length + 1 }}" class="muted">No {{ entity.plural|lower }} yet.</td></tr>
    {% endfor %}
    </tbody>
</table>
<div class="pager">
    {% if pager.prev %}<a href="{{ entity.list_path }}?page={{ pager.prev }}" rel="prev">&larr; Previous</a>{% endif %}
    <span class="muted">Page {{ pager.page }} &middot; {{ pager.total }} total</span>
    {% if pager.next %}<a href="{{ entity.list_path }}?page={{ pager.next }}" rel="next">Next &rarr;</a>{% endif %}
</div>
{% endblock %}
"#;

/// Create/edit form of one entity.
pub const ENTITY_FORM: &str = r#"{% extends "layout" %}
{% block title %}{% if record_id %}Edit{% else %}New{% endif %} {{ entity.singular }}{% endblock %}
{% block content %}
<h1>{% if record_id %}Edit {{ entity.singular }} #{{ record_id }}{% else %}New {{ entity.singular }}{% endif %}</h1>
<div class="panel">
<form method="post" action="{{ entity.edit_path }}{% if record_id %}?id={{ record_id }}{% endif %}" id="entity-form">
    <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
    {% for field in fields %}
    {% if field.kind == "hidden" %}
    <input type="hidden" name="{{ field.name }}" value="{{ field.value }}">
    {% else %}
    <div class="field">
        {% if field.kind == "checkbox" %}
        <label><input type="checkbox" name="{{ field.name }}" value="y"{% if field.checked %} checked{% endif %}> {{ field.label }}</label>
        {% else %}
        <label for="{{ field.name }}">{{ field.label }}{% if field.required %} *{% endif %}</label>
        {% if field.kind == "select" %}
        <select id="{{ field.name }}" name="{{ field.name }}">
            <option value="">&mdash;</option>
            {% for option in field.options %}<option value="{{ option.value }}"{% if option.selected %} selected{% endif %}>{{ option.label }}</option>{% endfor %}
        </select>
        {% elif field.kind == "multi_select" %}
        <select id="{{ field.name }}" name="{{ field.name }}" multiple>
            {% for option in field.options %}<option value="{{ option.value }}"{% if option.selected %} selected{% endif %}>{{ option.label }}</option>{% endfor %}
        </select>
        {% else %}
        <input type="{% if field.kind == "password" %}password{% else %}text{% endif %}" id="{{ field.name }}" name="{{ field.name }}" value="{{ field.value }}">
        {% endif %}
        {% endif %}
        {% if field.description %}<div class="hint">{{ field.description }}</div>{% endif %}
        {% if field.errors %}<ul class="errors">{% for error in field.errors %}<li>{{ error }}</li>{% endfor %}</ul>{% endif %}
    </div>
    {% endif %}
    {% endfor %}
    <div class="actions">
        <button type="submit">Save</button>
        <a href="{{ entity.list_path }}">Cancel</a>
    </div>
</form>
{% if record_id %}
<form method="post" action="{{ entity.edit_path }}?id={{ record_id }}&amp;delete=1" id="delete-form" style="margin-top: 1rem;">
    <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
    <button type="submit" class="danger">Delete {{ entity.singular }}</button>
</form>
{% endif %}
</div>
{% endblock %}
"#;

/// Error page for every non-2xx response the UI renders.
pub const ERROR: &str = r#"{% extends "layout" %}
{% block title %}{{ status }} {{ reason }}{% endblock %}
{% block content %}
<div class="panel">
    <h1>{{ status }} {{ reason }}</h1>
    <p>{{ message }}</p>
    <p><a href="/dashboard">Back to the dashboard</a></p>
</div>
{% endblock %}
"#;

/// `(name, source)` of every template.
pub const ALL: &[(&str, &str)] = &[
    ("layout", LAYOUT),
    ("login", LOGIN),
    ("dashboard", DASHBOARD),
    ("entity_list", ENTITY_LIST),
    ("entity_form", ENTITY_FORM),
    ("error", ERROR),
];
