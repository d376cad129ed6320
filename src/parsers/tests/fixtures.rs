//! A saved analytics snapshot trimmed to the parts the extractors read.

const BOUNCE_RATE_ITEM: &str = r#"
                <div class="engagement-list__item">
                    <p class="engagement-list__item-name" data-test="bounce-rate">Bounce Rate</p>
                    <p class="engagement-list__item-value">55.43%</p>
                </div>"#;

/// Full snapshot page; `include_bounce_rate: false` drops that one metric
pub fn snapshot_html(include_bounce_rate: bool) -> String {
    let bounce_rate = if include_bounce_rate { BOUNCE_RATE_ITEM } else { "" };
    format!(
        r##"<!DOCTYPE html>
<html>
<head><title>example.com Traffic Analytics</title></head>
<body>
    <div class="wa-rank-list">
        <div class="wa-rank-list__item wa-rank-list__item--global">
            <p class="wa-rank-list__title">Global Rank</p>
            <p class="wa-rank-list__value">#7,435</p>
        </div>
        <div class="wa-rank-list__item wa-rank-list__item--country">
            <p class="wa-rank-list__value">#1,204</p>
        </div>
    </div>

    <div class="wa-overview">
        <div class="wa-overview__column wa-overview__column--engagement">
            <div class="engagement-list">
                <div class="engagement-list__item">
                    <p class="engagement-list__item-name" data-test="total-visits">Total Visits</p>
                    <p class="engagement-list__item-value">9.1M</p>
                </div>{bounce_rate}
                <div class="engagement-list__item">
                    <p class="engagement-list__item-name" data-test="pages-per-visit">Pages per Visit</p>
                    <p class="engagement-list__item-value">3</p>
                </div>
                <div class="engagement-list__item">
                    <p class="engagement-list__item-name" data-test="avg-visit-duration">Avg Visit Duration</p>
                    <p class="engagement-list__item-value">00:02:26</p>
                </div>
            </div>
        </div>
    </div>

    <div class="wa-traffic">
        <div class="wa-traffic__engagement">
            <div class="wa-traffic__engagement-item">
                <span class="wa-traffic__engagement-item-title">Total Visits</span>
                <span class="wa-traffic__engagement-item-value">9.1M</span>
            </div>
            <div class="wa-traffic__engagement-item">
                <span class="wa-traffic__engagement-item-title">Last Month Change</span>
                <span class="wa-traffic__engagement-item-value">-5.43%</span>
            </div>
        </div>
        <div class="wa-traffic__chart">
            <svg width="400" height="200">
                <g class="highcharts-axis-labels highcharts-xaxis-labels">
                    <text x="40" y="190">Jan</text>
                    <text x="160" y="190">Feb</text>
                    <text x="280" y="190">Mar</text>
                </g>
                <g class="highcharts-data-labels">
                    <text><tspan class="wa-traffic__chart-data-label">8.6M</tspan></text>
                    <text><tspan class="wa-traffic__chart-data-label">1,234,567</tspan></text>
                    <text><tspan class="wa-traffic__chart-data-label">9.1M</tspan></text>
                </g>
            </svg>
        </div>
    </div>

    <div class="wa-ranking">
        <div class="wa-ranking__main-content">
            <svg width="400" height="200">
                <g class="highcharts-series highcharts-series-0" transform="translate(10,10)">
                    <path class="highcharts-graph" d="M 30 0 L 150 50 L 270 100"></path>
                </g>
                <g class="highcharts-axis-labels highcharts-xaxis-labels">
                    <text x="40" y="190">Jan</text>
                    <text x="160" y="190">Feb</text>
                    <text x="280" y="190">Mar</text>
                </g>
                <g class="highcharts-axis-labels highcharts-yaxis-labels">
                    <text x="0" y="110">0</text>
                    <text x="0" y="60">50</text>
                    <text x="0" y="10">100</text>
                </g>
            </svg>
        </div>
    </div>

    <div class="wa-geography">
        <div class="wa-geography__country wa-geography__legend-item">
            <a class="wa-geography__country-name" href="/country/us">United States</a>
            <span class="wa-geography__country-traffic-value">35.12%</span>
        </div>
        <div class="wa-geography__country wa-geography__legend-item">
            <span class="wa-geography__country-name">Germany</span>
            <span class="wa-geography__country-traffic-value">6.4%</span>
        </div>
        <div class="wa-geography__country wa-geography__legend-item">
            <span class="wa-geography__country-name">Others</span>
        </div>
    </div>

    <div class="wa-demographics">
        <div class="wa-demographics__age">
            <svg width="400" height="200">
                <g class="highcharts-axis-labels highcharts-xaxis-labels">
                    <text>18 - 24</text>
                    <text>25 - 34</text>
                    <text>65+</text>
                </g>
                <text><tspan class="wa-demographics__age-data-label">21.3%</tspan></text>
                <text><tspan class="wa-demographics__age-data-label">30.15%</tspan></text>
                <text><tspan class="wa-demographics__age-data-label">--</tspan></text>
            </svg>
        </div>
    </div>
</body>
</html>"##
    )
}

/// A page from some other site: nothing the extractors look for
pub const UNRELATED_HTML: &str =
    "<html><body><h1>Maintenance</h1><p>Back soon.</p></body></html>";
