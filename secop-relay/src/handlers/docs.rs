use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <title>SECOP II relay</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
    code { background: #f2f2f2; padding: 0.1rem 0.3rem; border-radius: 3px; }
    dt { margin-top: 1rem; font-weight: bold; }
  </style>
</head>
<body>
  <h1>SECOP II relay</h1>
  <p>
    Consulta procesos de contratación publicados en SECOP II que aún no han sido adjudicados.
    Todos los endpoints aceptan el parámetro opcional <code>fecha</code> (<code>YYYY-MM-DD</code>);
    sin él se usa el día hábil anterior.
  </p>
  <dl>
    <dt><a href="/raw">GET /raw</a></dt>
    <dd>Todos los campos de cada proceso. Respuesta: <code>{date_used, total_records, data}</code>.</dd>
    <dt><a href="/filtered">GET /filtered</a></dt>
    <dd>Selección de 20 campos relevantes. Respuesta: <code>{date_used, total_records, data}</code>.</dd>
    <dt><a href="/analyzed">GET /analyzed</a></dt>
    <dd>
      Selección reducida de 10 campos evaluada por un modelo de lenguaje según el perfil de la firma.
      Respuesta: <code>{date_used, total_records_analyzed, ai_analysis}</code>.
    </dd>
  </dl>
  <p>Ejemplo: <code>/filtered?fecha=2025-04-18</code></p>
</body>
</html>
"#;

/// Documentation page listing the endpoints.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
