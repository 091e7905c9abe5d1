/// Standalone Leaflet page. `__TITLE__`, `__CONTROLS__` and `__MAP_PAYLOAD__`
/// are substituted by `map::page::render_page`.
pub const MAP_PAGE_HTML: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>

  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous"
    referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"
    referrerpolicy="no-referrer"></script>

  <style>
    html, body { height: 100%; margin: 0; }
    body { display: flex; flex-direction: column; font-family: system-ui, sans-serif; }
    header {
      display: flex; flex-wrap: wrap; align-items: center; gap: 0.75rem 1.5rem;
      padding: 0.6rem 1rem; background: #0f172a; color: #e2e8f0;
    }
    header h1 { margin: 0; font-size: 1.25rem; font-weight: 600; }
    header a { color: #7dd3fc; }
    .controls { display: inline-flex; flex-wrap: wrap; align-items: center; gap: 0.5rem; }
    .controls label { cursor: pointer; }
    .source { font-size: 0.85rem; color: #94a3b8; }
    #map { flex: 1; }
    .legend {
      background: rgba(255, 255, 255, 0.92); padding: 0.5rem 0.75rem; border-radius: 6px;
      line-height: 1.5; box-shadow: 0 1px 4px rgba(0, 0, 0, 0.3);
    }
    .legend i {
      display: inline-block; width: 12px; height: 12px; margin-right: 6px;
      border-radius: 50%; vertical-align: middle; opacity: 0.8;
    }
  </style>
</head>

<body>
  <header>
    <h1>__TITLE__</h1>
    __CONTROLS__
  </header>
  <div id="map"></div>

  <script id="map-payload" type="application/json">__MAP_PAYLOAD__</script>
  <script>
    (function () {
      const payload = JSON.parse(document.getElementById('map-payload').textContent);
      const documents = payload.documents;
      if (!documents.length) return;

      const first = documents[0];
      const map = L.map('map').setView(first.center, first.zoom);
      L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
        maxZoom: 19,
        attribution: '&copy; OpenStreetMap contributors'
      }).addTo(map);

      let drawn = [];
      let layerControl = null;
      let legend = null;

      function draw(metric) {
        const doc = documents.find((d) => d.metric === metric) || first;
        drawn.forEach((group) => map.removeLayer(group));
        drawn = [];
        if (layerControl) layerControl.remove();
        if (legend) legend.remove();

        const overlays = {};
        doc.layers.forEach((layer) => {
          const group = L.featureGroup();
          layer.markers.forEach((m) => {
            L.circleMarker([m.lat, m.lon], {
              radius: m.radius,
              color: layer.color,
              fill: true,
              fillColor: layer.color,
              fillOpacity: layer.fill_opacity
            })
              .bindPopup(m.popup, { maxWidth: 500 })
              .bindTooltip(m.tooltip)
              .addTo(group);
          });
          group.addTo(map);
          drawn.push(group);
          overlays[layer.name] = group;
        });

        layerControl = L.control.layers(null, overlays, { collapsed: false }).addTo(map);

        legend = L.control({ position: 'bottomleft' });
        legend.onAdd = function () {
          const div = L.DomUtil.create('div', 'legend');
          div.innerHTML = doc.legend
            .map((entry) => `<div><i style="background:${entry.color}"></i>${entry.label}</div>`)
            .join('');
          return div;
        };
        legend.addTo(map);
      }

      document.querySelectorAll('input[name="metric"]').forEach((input) => {
        input.addEventListener('change', (event) => draw(event.target.value));
      });
      draw(payload.selected);

      const form = document.getElementById('upload-form');
      if (!form) return;
      form.addEventListener('submit', async (event) => {
        event.preventDefault();
        const file = form.querySelector('input[type="file"]').files[0];
        const checked = document.querySelector('input[name="metric"]:checked');
        const params = new URLSearchParams({
          scope: form.querySelector('select[name="scope"]').value,
          metric: checked ? checked.value : payload.selected
        });
        if (file) params.set('name', file.name);
        const response = await fetch('/upload?' + params.toString(), { method: 'POST', body: file || '' });
        const body = await response.text();
        if (!response.ok) {
          alert(body);
          return;
        }
        document.open();
        document.write(body);
        document.close();
      });
    })();
  </script>
</body>

</html>
"#;
