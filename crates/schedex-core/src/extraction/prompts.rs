/// Instruction for reading every panel schedule in an image into records.
pub const PANEL_EXTRACTION: &str = r#"
You read electrical engineering drawings. Extract every electrical panel schedule
(switchboard directory) visible in this image.

Rules:
1. Each panel schedule is its own table. Never mix circuits from different panels.
2. A panel's header (name, ratings) sits at the top of its table.
3. When a panel lists circuits in a left and a right column, give the left column
   top to bottom first, then the right column top to bottom.
4. Keep circuits in the order they appear.

Per panel, read the header:
- panel_name: designation, e.g. "AP-1", "PC-LP-01-01"
- main_rating: e.g. "100A MLO", "400A MCB"
- voltage: e.g. "208Y/120", "277V/480V"
- phase: e.g. "3", "1Ph"
- wire: e.g. "4W", "3"
- poles: panel pole count, e.g. "42"
- kaic: short-circuit rating, e.g. "22,000"
- enclosure: e.g. "NEMA1", "Type 1"

and every circuit row of that panel:
- load_description: what the circuit feeds
- ocp_size: breaker or fuse size, e.g. "20A"
- poles: 1, 2 or 3
- feeder: conductor size/type if shown
- circuit_number: circuit number if shown

Reply with compact JSON only, no other text:
{"panels":[{"panel_header":{"panel_name":"","main_rating":"","voltage":"","phase":"","wire":"","poles":"","kaic":"","enclosure":""},"circuits":[{"load_description":"","ocp_size":"","poles":"","feeder":"","circuit_number":""}]}]}

Use "" for any field that is not shown. If there are no panel schedules, reply {"panels":[]}.
"#;

/// Instruction for locating panel schedules as percentage bounding boxes.
pub const PANEL_LOCATION: &str = r#"
You read electrical engineering drawings. Find every electrical panel schedule
(switchboard directory) on this sheet and give its bounding box.

Boundaries:
- Circuit number columns often sit outside the main table border on the far left
  and far right. The box must include them.
- The top edge must include the full panel header; the bottom edge the last
  circuit row.
- Panel schedules have solid rectangular borders. Ignore revision clouds.

Give coordinates as percentages (0-100) of the sheet width and height.

Reply with compact JSON only:
{"panels":[{"panel_name":"PC-LP-01-01","bbox":{"x1":4.5,"y1":10.0,"x2":49.5,"y2":85.0}}]}

If there are no panel schedules, reply {"panels":[]}.
"#;

/// Connectivity check used by `ping`.
pub const PING: &str = "Say 'hello' in one word";
