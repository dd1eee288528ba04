pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# AUDIT TRAIL RECEIVER CONFIGURATION
# =============================================================================
# Polls the Scaleway Audit Trail API for new events and writes them as
# structured log records.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/audit-trail-receiver/config.yml
#   3. /etc/audit-trail-receiver/config.yml
#
# Values of the form $env{VAR_NAME} are replaced by the environment variable
# before the file is parsed.

# =============================================================================
# RECEIVER
# =============================================================================
# Only events recorded after the receiver started are shipped. Each tick asks
# for the events recorded since the previous successful tick.

receiver:
  # How often to poll. Must be at least 1m.
  interval: 1m
  # Page size used for each API call. Must be at least 1.
  max_events_per_request: 100

# =============================================================================
# SCALEWAY
# =============================================================================

scaleway:
  api_url: https://api.scaleway.com
  secret_key: $env{SCW_SECRET_KEY}
  organization_id: $env{SCW_DEFAULT_ORGANIZATION_ID}
  region: fr-par
  # Timeout of a single API call
  timeout: 30s

# =============================================================================
# OUTPUT
# =============================================================================
# 'stdout' writes one JSON object per log record to standard output.
# 'file' appends the same lines to 'path'.

output:
  type: stdout
  # type: file
  # path: /var/log/audit-trail-receiver/events.ndjson
"#
    .to_string()
}
