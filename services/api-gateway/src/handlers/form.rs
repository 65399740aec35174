use axum::response::Html;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <title>Crosstabs de materiales</title>
</head>
<body>
  <h1>Crosstabs de materiales</h1>
  <form action="/generate_excel/" method="post" enctype="multipart/form-data">
    <p><label>Libro completo (BOM_EA, BOM_EB y COOIS): <input type="file" name="archivo"></label></p>
    <p>o bien</p>
    <p><label>Stocks (BOM_EA y BOM_EB): <input type="file" name="archivo_stocks"></label></p>
    <p><label>COOIS: <input type="file" name="archivo_coois"></label></p>
    <p>
      <label>Descargar EA
        <select name="download_ea"><option value="true">Sí</option><option value="false">No</option></select>
      </label>
      <label>Descargar EB
        <select name="download_eb"><option value="true">Sí</option><option value="false">No</option></select>
      </label>
    </p>
    <p><button type="submit">Generar</button></p>
  </form>
</body>
</html>
"#;

/// GET /
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
